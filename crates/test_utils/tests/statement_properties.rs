//! Statement invariants over randomly posted ledgers
//!
//! Random balanced journals are posted through the service against the
//! in-memory store; every statement built afterwards must tie out.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use domain_ledger::requests::{JournalLineInput, JournalVoucherBody};
use domain_ledger::DocumentBody;
use test_utils::*;

/// What the statements said about one generated ledger
#[derive(Debug)]
struct Observed {
    trial_debit: Decimal,
    trial_credit: Decimal,
    trial_balanced: bool,
    sheet_difference: Decimal,
    sheet_balanced: bool,
    cash_difference: Decimal,
    cash_reconciled: bool,
    excluded: usize,
}

fn observe(
    journals: Vec<(NaiveDate, Vec<JournalLineInput>)>,
    as_of: NaiveDate,
    from: NaiveDate,
    to: NaiveDate,
) -> Observed {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let f = LedgerFixture::new().await;
        for (entry_date, lines) in journals {
            f.ledger
                .record(
                    RequestBuilder::new(f.tenant_id, f.user_id)
                        .on(entry_date)
                        .body(DocumentBody::JournalVoucher(JournalVoucherBody { lines })),
                )
                .await
                .unwrap();
        }

        let tb = f.reports.trial_balance(f.tenant_id, from, to).await.unwrap();
        let sheet = f.reports.balance_sheet(f.tenant_id, as_of).await.unwrap();
        let cf = f.reports.cash_flow(f.tenant_id, from, to).await.unwrap();

        Observed {
            trial_debit: tb.totals.debit,
            trial_credit: tb.totals.credit,
            trial_balanced: tb.totals.is_balanced,
            sheet_difference: sheet.totals.difference,
            sheet_balanced: sheet.totals.is_balanced,
            cash_difference: cf.reconciliation.difference,
            cash_reconciled: cf.reconciliation.is_reconciled,
            excluded: tb.excluded_accounts.len()
                + sheet.excluded_accounts.len()
                + cf.excluded_accounts.len(),
        }
    })
}

fn journals_strategy() -> impl Strategy<Value = Vec<(NaiveDate, Vec<JournalLineInput>)>> {
    prop::collection::vec((entry_date_2024(), balanced_lines_strategy()), 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn statements_tie_out_for_any_dates(
        journals in journals_strategy(),
        as_of in entry_date_2024(),
        a in entry_date_2024(),
        b in entry_date_2024(),
    ) {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        let observed = observe(journals, as_of, from, to);

        prop_assert_eq!(observed.trial_debit, observed.trial_credit);
        prop_assert!(observed.trial_balanced);
        prop_assert!(observed.sheet_balanced, "balance sheet off by {}", observed.sheet_difference);
        prop_assert!(observed.cash_reconciled, "cash flow off by {}", observed.cash_difference);
        prop_assert_eq!(observed.excluded, 0);
    }
}
