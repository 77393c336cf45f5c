// Purpose - external formats and the collaborators that receive them

pub mod converter;
pub mod export;
pub mod wav;
