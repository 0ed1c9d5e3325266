use std::sync::Arc;

use crate::application::repos::HealthRepo;
use crate::application::todos::TodoService;
use crate::application::users::UserService;

#[derive(Clone)]
pub struct ApiState {
    pub todos: Arc<TodoService>,
    pub users: Arc<UserService>,
    pub health: Arc<dyn HealthRepo>,
}
