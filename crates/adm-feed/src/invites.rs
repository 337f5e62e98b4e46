//! Invite codes and the invitations recorded against them.

use std::fmt;

use adm_reconcile::Record;
use serde::{Deserialize, Serialize};

use crate::orders::{lenient_opt_i64, lenient_string};

pub const INVITE_CODE_MAX_LEN: usize = 50;
pub const INVITE_MAX_USES_LIMIT: u32 = 10_000;

/// `GET /admin/invite-codes` row. The backend sends these in snake_case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InviteCode {
    pub code: String,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub max_uses: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub current_uses: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub remaining_uses: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(default)]
    pub used_by: Option<String>,
    #[serde(default)]
    pub used_at: Option<String>,
}

impl InviteCode {
    pub fn is_exhausted(&self) -> bool {
        self.remaining_uses.is_some_and(|r| r <= 0)
    }
}

/// `GET /admin/invitations` item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub inviter_user_id: String,
    #[serde(default)]
    pub invitee_user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invite_code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invitee_phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invited_at: String,
}

impl Record for Invitation {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.invited_at
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InviteCodeError {
    Blank,
    TooLong(usize),
    MaxUsesOutOfRange(u32),
}

impl fmt::Display for InviteCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InviteCodeError::Blank => write!(f, "invite code must not be blank"),
            InviteCodeError::TooLong(n) => write!(
                f,
                "invite code is {n} characters, at most {INVITE_CODE_MAX_LEN} allowed"
            ),
            InviteCodeError::MaxUsesOutOfRange(n) => write!(
                f,
                "max uses {n} out of range 1..={INVITE_MAX_USES_LIMIT}"
            ),
        }
    }
}

impl std::error::Error for InviteCodeError {}

/// Body of `POST /v1/admin/create-invite-code`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewInviteCode {
    pub code: String,
    pub max_uses: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewInviteCode {
    pub fn new(
        code: &str,
        max_uses: u32,
        description: Option<&str>,
    ) -> Result<Self, InviteCodeError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(InviteCodeError::Blank);
        }
        let len = code.chars().count();
        if len > INVITE_CODE_MAX_LEN {
            return Err(InviteCodeError::TooLong(len));
        }
        if !(1..=INVITE_MAX_USES_LIMIT).contains(&max_uses) {
            return Err(InviteCodeError::MaxUsesOutOfRange(max_uses));
        }
        Ok(Self {
            code: code.to_string(),
            max_uses,
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        })
    }
}
