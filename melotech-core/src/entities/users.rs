use async_trait::async_trait;
use kanau::processor::Processor;

use crate::framework::DatabaseProcessor;
use crate::notify::{DirectoryError, UserDirectory};

#[derive(Debug, Clone)]
/// Look up the email of an auth user by its id.
///
/// Ids that are not UUIDs cannot exist in `auth.users` and yield `None`.
pub struct GetUserEmailByAuthId {
    pub auth_id: String,
}

impl Processor<GetUserEmailByAuthId> for DatabaseProcessor {
    type Output = Option<String>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetUserEmailByAuthId")]
    async fn process(&self, query: GetUserEmailByAuthId) -> Result<Option<String>, sqlx::Error> {
        let Ok(id) = uuid::Uuid::parse_str(&query.auth_id) else {
            return Ok(None);
        };
        let email = sqlx::query_scalar::<_, Option<String>>(
            r#"
            SELECT email FROM auth.users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(email.flatten())
    }
}

#[async_trait]
impl UserDirectory for DatabaseProcessor {
    async fn email_for(&self, recipient_key: &str) -> Result<Option<String>, DirectoryError> {
        let email = self
            .process(GetUserEmailByAuthId {
                auth_id: recipient_key.to_owned(),
            })
            .await?;
        Ok(email)
    }
}
