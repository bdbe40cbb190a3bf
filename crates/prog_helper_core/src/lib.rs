pub mod chat;
pub mod domain;
pub mod eligibility;
pub mod ports;
pub mod prompts;
pub mod rate_limit;
pub mod stats;

pub use domain::{
    Assessment, AssessmentKind, AssessmentQuestion, ChatSession, ChatTurn, GlobalStats, Identity,
    LanguageProgress, Message, MessageRole, ProfileUpdate, ProgrammingTask, Role, Stats,
    TaskStatus, User, UserTaskProgress,
};
pub use ports::{
    ClassificationService, CompletionService, DatabaseService, IdentityProvider, NewMessage,
    PortError, PortResult, TitleService,
};
pub use rate_limit::{FixedWindowLimiter, RateLimitDecision};
