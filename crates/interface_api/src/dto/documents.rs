//! Document DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, DocumentId, ExchangeRate, LedgerLineId, TenantId, UserId};
use domain_ledger::{DocumentBody, DocumentRequest, DocumentStatus, PostingReceipt};

/// Submission of a new document, or a replacement body for a draft
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub user_id: UserId,
    pub entry_date: NaiveDate,
    #[serde(default)]
    pub narration: String,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub exchange_rate: Option<ExchangeRate>,
    pub body: DocumentBody,
}

impl CreateDocumentRequest {
    pub fn into_request(self, tenant_id: TenantId) -> DocumentRequest {
        DocumentRequest {
            tenant_id,
            user_id: self.user_id,
            entry_date: self.entry_date,
            narration: self.narration,
            currency: self.currency,
            exchange_rate: self.exchange_rate,
            body: self.body,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReverseDocumentRequest {
    pub user_id: UserId,
    /// Defaults to the original entry date
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
}

/// Success envelope for writes
#[derive(Debug, Serialize)]
pub struct PostingResponse {
    pub success: bool,
    pub document_id: DocumentId,
    pub document_number: String,
    pub status: DocumentStatus,
    pub total: Decimal,
    pub ledger_line_ids: Vec<LedgerLineId>,
}

impl From<PostingReceipt> for PostingResponse {
    fn from(receipt: PostingReceipt) -> Self {
        Self {
            success: true,
            document_id: receipt.document_id,
            document_number: receipt.document_number,
            status: receipt.status,
            total: receipt.total,
            ledger_line_ids: receipt.ledger_line_ids,
        }
    }
}
