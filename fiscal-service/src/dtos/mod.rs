pub mod bill;
pub mod common;
pub mod invoice;
pub mod queue;
pub mod rate_table;
pub mod tax_summary;

pub use bill::{BillRequest, BillResponse};
pub use common::{ExistsResponse, TotalResponse};
pub use invoice::{InvoiceRequest, InvoiceResponse};
pub use queue::{QueueReceiveResponse, QueueSendResponse, SendParams};
pub use rate_table::{RateTableRequest, RateTableResponse};
pub use tax_summary::{ComputeParams, PeriodParams, TaxSummaryRequest, TaxSummaryResponse};
