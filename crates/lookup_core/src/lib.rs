pub mod dataset;
pub mod domain;
pub mod history;
pub mod oracle;
pub mod pipeline;
pub mod ports;
pub mod preferences;
pub mod validation;

#[cfg(test)]
mod testing;

pub use dataset::{parse_dataset, search, DatasetFetcher};
pub use domain::{
    Credentials, DatasetRecord, HistoryEntry, PlatformId, PlatformInfo, ResultData, SearchResult,
    PLATFORMS,
};
pub use history::HistoryStore;
pub use oracle::oracle;
pub use pipeline::{
    DelayWindow, LookupMode, Outcome, PipelineState, SearchPipeline, StageTimings, SubmitError,
};
pub use ports::{ClipboardError, ClipboardService, DatasetSource, KeyValueStore, PortError, PortResult};
pub use preferences::{Preferences, SessionSnapshot};
pub use validation::{ValidationError, ValidationPolicy};
