pub mod cache_entry;
pub mod field_record;
pub mod queued_mutation;
pub mod sync_report;

pub use cache_entry::CacheEntry;
pub use field_record::{
    ChangeRequestRecord, CorrectiveMaintenanceRecord, FieldRecord, GpLiveCheckRecord,
    PatrollerTaskRecord, PreventiveMaintenanceRecord, PunchInRecord,
};
pub use queued_mutation::{MutationDraft, QueuedMutation};
pub use sync_report::{MutationFailure, SyncReport, SyncTrigger};
