/// Data models for the blog service
///
/// - `post`: posts, comments, likes and the feed projections built from them
/// - `user`: accounts and the public author/profile views
pub mod post;
pub mod user;

pub use post::{
    Comment, CommentView, FeedPage, LikeToggle, NewComment, NewPost, Post, PostDetail, PostPatch,
    PostSummary, PostSummaryRecord, PostUpdate,
};
pub use user::{AuthorInfo, NewUser, User, UserProfile, DEFAULT_PROFILE_PICTURE};
