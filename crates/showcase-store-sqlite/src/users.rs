//! [`UserStore`] for [`SqliteStore`]: accounts, sessions, follows.

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use showcase_core::{
  ActorContext, EntityKind, Error as CoreError,
  store::UserStore,
  user::{NewUser, Session, User, UserProfile},
};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    RawUser, USER_COLUMNS, decode_role, decode_uuid, encode_dt, encode_role, encode_uuid,
    stored_dt,
  },
};

impl SqliteStore {
  async fn list_users_where(&self, sql: &'static str, user_id: Uuid) -> Result<Vec<User>> {
    let id_str = encode_uuid(user_id);
    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }
}

impl UserStore for SqliteStore {
  async fn add_user(&self, input: NewUser, at: DateTime<Utc>) -> Result<User> {
    let user = User {
      user_id:      Uuid::new_v4(),
      username:     input.username,
      display_name: input.display_name,
      bio:          input.bio,
      role:         input.role,
      created_at:   stored_dt(at),
    };

    let id_str       = encode_uuid(user.user_id);
    let username     = user.username.clone();
    let display_name = user.display_name.clone();
    let bio          = user.bio.clone();
    let role_str     = encode_role(user.role);
    let at_str       = encode_dt(at);
    let hash         = input.password_hash;

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO users (user_id, username, display_name, bio, role, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (username) DO NOTHING",
          rusqlite::params![id_str, username, display_name, bio, role_str, hash, at_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    if !inserted {
      return Err(
        CoreError::Conflict(format!("username {:?} is taken", user.username)).into(),
      );
    }
    tracing::info!(user_id = %user.user_id, username = %user.username, "user registered");
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_credentials(&self, username: String) -> Result<Option<(User, String)>> {
    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {USER_COLUMNS}, u.password_hash FROM users u WHERE u.username = ?1"
            ),
            rusqlite::params![username],
            |row| Ok((RawUser::from_row(row)?, row.get(6)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(u, hash)| -> Result<_> { Ok((u.into_user()?, hash)) })
      .transpose()
  }

  async fn open_session(&self, session: Session) -> Result<()> {
    let user_str    = encode_uuid(session.user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);
    let hash        = session.token_hash;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![hash, user_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn resolve_session(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> Result<Option<ActorContext>> {
    let now_str = encode_dt(now);

    let raw: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT u.user_id, u.role
             FROM sessions s
             JOIN users u ON u.user_id = s.user_id
             WHERE s.token_hash = ?1 AND s.expires_at > ?2",
            rusqlite::params![token_hash, now_str],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(id, role)| -> Result<_> {
        Ok(ActorContext::new(decode_uuid(&id)?, decode_role(&role)?))
      })
      .transpose()
  }

  async fn close_session(&self, token_hash: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn follow(&self, follower: Uuid, followee: Uuid, at: DateTime<Utc>) -> Result<()> {
    if follower == followee {
      return Err(CoreError::InvalidInput("cannot follow yourself".to_owned()).into());
    }

    let follower_str = encode_uuid(follower);
    let followee_str = encode_uuid(followee);
    let at_str       = encode_dt(at);

    let followee_exists = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM users WHERE user_id = ?1",
            rusqlite::params![followee_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if exists {
          conn.execute(
            "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![follower_str, followee_str, at_str],
          )?;
        }
        Ok(exists)
      })
      .await?;

    if !followee_exists {
      return Err(CoreError::not_found(EntityKind::User, followee).into());
    }
    Ok(())
  }

  async fn unfollow(&self, follower: Uuid, followee: Uuid) -> Result<()> {
    let follower_str = encode_uuid(follower);
    let followee_str = encode_uuid(followee);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
          rusqlite::params![follower_str, followee_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_followers(&self, user_id: Uuid) -> Result<Vec<User>> {
    self
      .list_users_where(
        "SELECT u.user_id, u.username, u.display_name, u.bio, u.role, u.created_at
         FROM follows f JOIN users u ON u.user_id = f.follower_id
         WHERE f.followee_id = ?1
         ORDER BY f.created_at",
        user_id,
      )
      .await
  }

  async fn list_following(&self, user_id: Uuid) -> Result<Vec<User>> {
    self
      .list_users_where(
        "SELECT u.user_id, u.username, u.display_name, u.bio, u.role, u.created_at
         FROM follows f JOIN users u ON u.user_id = f.followee_id
         WHERE f.follower_id = ?1
         ORDER BY f.created_at",
        user_id,
      )
      .await
  }

  async fn profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<(RawUser, i64, i64, i64)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {USER_COLUMNS},
                 (SELECT COUNT(*) FROM follows  WHERE followee_id = u.user_id),
                 (SELECT COUNT(*) FROM follows  WHERE follower_id = u.user_id),
                 (SELECT COUNT(*) FROM projects WHERE owner_id = u.user_id AND is_deleted = 0)
               FROM users u WHERE u.user_id = ?1"
            ),
            rusqlite::params![id_str],
            |row| Ok((RawUser::from_row(row)?, row.get(6)?, row.get(7)?, row.get(8)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(u, followers, following, projects)| -> Result<_> {
        Ok(UserProfile {
          user:            u.into_user()?,
          follower_count:  u64::try_from(followers).unwrap_or(0),
          following_count: u64::try_from(following).unwrap_or(0),
          project_count:   u64::try_from(projects).unwrap_or(0),
        })
      })
      .transpose()
  }
}
