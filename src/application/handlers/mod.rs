//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod briefing;

pub use briefing::{
    AddCommentCommand, AddCommentHandler, BriefingDetail, CreateBriefingCommand,
    CreateBriefingHandler, CreateBriefingResult, GetBriefingHandler, GetBriefingQuery,
    GetVersionHandler, GetVersionQuery, ListChatHandler, ListChatQuery, ListCommentsHandler,
    ListCommentsQuery, ListVersionsHandler, ListVersionsQuery, PreviewDataPackHandler,
    PreviewDataPackQuery, ReviseBriefingCommand, ReviseBriefingHandler,
};
