use sqlx::{Pool, Sqlite};

mod category;
pub use category::CategoryExt;

mod comment;
pub use comment::CommentExt;

mod genre;
pub use genre::GenreExt;

mod review;
pub use review::ReviewExt;

mod title;
pub use title::{TitleExt, TitleFilter};

mod user;
pub use user::UserExt;

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Sqlite>,
}

impl DBClient {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        DBClient { pool }
    }
}
