pub mod auth;
pub mod chat_llm;
pub mod classify_llm;
pub mod db;
pub mod title_llm;

pub use auth::HttpIdentityProvider;
pub use chat_llm::OpenAiChatAdapter;
pub use classify_llm::OpenAiClassifyAdapter;
pub use db::DbAdapter;
pub use title_llm::OpenAiTitleAdapter;
