pub(crate) mod memo_repository;
pub(crate) mod poller;
pub(crate) mod side_tables;
pub(crate) mod users;

pub(crate) use memo_repository::{DeleteOutcome, LoadOutcome, MemoRepository, SubmitMemo};
pub(crate) use poller::Poller;
pub(crate) use side_tables::{favorite_memos, Archive, ArchiveUseCase, Favorites};
pub(crate) use users::KnownUsers;
