pub mod story_repo;
pub mod user_repo;

pub use story_repo::StoryRepo;
pub use user_repo::UserRepo;
