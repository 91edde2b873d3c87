//! Database entities.

pub mod comment;
pub mod like;
pub mod playlist;
pub mod playlist_video;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::Entity as Comment;
pub use like::Entity as Like;
pub use playlist::Entity as Playlist;
pub use playlist_video::Entity as PlaylistVideo;
pub use subscription::Entity as Subscription;
pub use tweet::Entity as Tweet;
pub use user::Entity as User;
pub use video::Entity as Video;
