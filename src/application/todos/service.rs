use std::sync::Arc;

use crate::application::repos::{TodosRepo, TodosWriteRepo, UsersRepo};
use crate::cache::{CacheAside, CacheInvalidator};

/// Todo reads go through the cache-aside engine; writes invalidate after commit.
#[derive(Clone)]
pub struct TodoService {
    pub(crate) reader: Arc<dyn TodosRepo>,
    pub(crate) writer: Arc<dyn TodosWriteRepo>,
    pub(crate) users: Arc<dyn UsersRepo>,
    pub(crate) cache: CacheAside,
    pub(crate) invalidator: CacheInvalidator,
}

impl TodoService {
    pub fn new(
        reader: Arc<dyn TodosRepo>,
        writer: Arc<dyn TodosWriteRepo>,
        users: Arc<dyn UsersRepo>,
        cache: CacheAside,
        invalidator: CacheInvalidator,
    ) -> Self {
        Self {
            reader,
            writer,
            users,
            cache,
            invalidator,
        }
    }
}
