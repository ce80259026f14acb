use crate::constants::{BOOTSTRAP_ADMIN_EMAIL, BOOTSTRAP_ADMIN_PASSWORD, DEFAULT_API_KEY};
use crate::entities::{prelude::*, profiles, user_roles, users};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Hash the bootstrap password using Argon2id
fn hash_default_password() -> Result<String, DbErr> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(BOOTSTRAP_ADMIN_PASSWORD.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbErr::Custom(format!("Failed to hash default password: {e}")))
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = crate::domain::clock::now_stamp();
        let admin_id = uuid::Uuid::new_v4().to_string();
        let password_hash = hash_default_password()?;

        // Must change the password on first login
        let insert_user = Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Id,
                users::Column::Email,
                users::Column::PasswordHash,
                users::Column::ApiKey,
                users::Column::MustChangePassword,
                users::Column::CreatedAt,
                users::Column::UpdatedAt,
            ])
            .values_panic([
                admin_id.clone().into(),
                BOOTSTRAP_ADMIN_EMAIL.into(),
                password_hash.into(),
                DEFAULT_API_KEY.into(),
                true.into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .to_owned();
        manager.exec_stmt(insert_user).await?;

        let insert_profile = Query::insert()
            .into_table(Profiles)
            .columns([
                profiles::Column::Id,
                profiles::Column::Email,
                profiles::Column::FullName,
                profiles::Column::CreatedAt,
                profiles::Column::UpdatedAt,
            ])
            .values_panic([
                admin_id.clone().into(),
                BOOTSTRAP_ADMIN_EMAIL.into(),
                "Lab Administrator".into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .to_owned();
        manager.exec_stmt(insert_profile).await?;

        let insert_role = Query::insert()
            .into_table(UserRoles)
            .columns([
                user_roles::Column::Id,
                user_roles::Column::UserId,
                user_roles::Column::Role,
                user_roles::Column::CreatedAt,
            ])
            .values_panic([
                uuid::Uuid::new_v4().to_string().into(),
                admin_id.into(),
                "admin".into(),
                now.into(),
            ])
            .to_owned();
        manager.exec_stmt(insert_role).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Users)
            .and_where(Expr::col(users::Column::Email).eq(BOOTSTRAP_ADMIN_EMAIL))
            .to_owned();
        manager.exec_stmt(delete).await?;

        Ok(())
    }
}
