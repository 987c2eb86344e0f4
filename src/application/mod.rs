//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! `DataPackBuilder` and `RevisionOrchestrator` hold the pipeline; the
//! handlers are the thin command/query surface over them.

mod data_pack_builder;
pub mod handlers;
mod orchestrator;

pub use data_pack_builder::DataPackBuilder;
pub use orchestrator::{CreatedBriefing, RevisionOrchestrator, RevisionSettings};

pub use handlers::{
    AddCommentCommand, AddCommentHandler, BriefingDetail, CreateBriefingCommand,
    CreateBriefingHandler, CreateBriefingResult, GetBriefingHandler, GetBriefingQuery,
    GetVersionHandler, GetVersionQuery, ListChatHandler, ListChatQuery, ListCommentsHandler,
    ListCommentsQuery, ListVersionsHandler, ListVersionsQuery, PreviewDataPackHandler,
    PreviewDataPackQuery, ReviseBriefingCommand, ReviseBriefingHandler,
};
