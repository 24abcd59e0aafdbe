mod answer;
mod article;
mod contemplation;
mod intention;
mod project;
mod quote;

pub use answer::{Answer, AnswerFilter, AnswerUpdate, NewAnswer, NoteColor, Position};
pub use article::{Article, ArticleContent, ArticleUpdate, BlockKind, ContentBlock, NewArticle};
pub use contemplation::{Contemplation, ContemplationUpdate, NewContemplation, ReorderItem};
pub use intention::{Intention, IntentionUpdate, NewIntention};
pub use project::{
    NewProject, Project, ProjectLink, ProjectSection, ProjectStatus, ProjectUpdate,
};
pub use quote::{NewQuote, Quote, QuoteUpdate};
