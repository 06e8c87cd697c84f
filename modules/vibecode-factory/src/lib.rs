pub mod approval;
pub mod config;
pub mod error;
pub mod estimate;
pub mod generator;
pub mod orchestrator;
pub mod pacing;
pub mod parser;
pub mod retry;
pub mod sanitize;
pub mod store;
pub mod template;
pub mod types;

pub use config::{ConfigArgs, FactoryConfig, StoreLocation};
pub use error::{FactoryError, GenerationError, ParseError, RowError, StoreError};
pub use generator::GenerationClient;
pub use orchestrator::{inspect, BatchOrchestrator, InspectReport, RunReport, RunSettings};
pub use store::{CsvStore, MemoryStore, RowStore, SheetsStore};
pub use template::PromptTemplate;
pub use types::{GenerationRequest, GenerationResult, OutputFields, Row};
