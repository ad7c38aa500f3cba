use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default page number when the caller omits `page`
pub const DEFAULT_PAGE: i64 = 1;
/// Default page size when the caller omits `limit`
pub const DEFAULT_LIMIT: i64 = 10;

/// User entity as stored and returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Storage-assigned identifier
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    /// Unique across all users, inactive ones included
    pub email: String,
    /// Cleared by soft delete, never set back by this service
    pub active: bool,
}

/// Payload of `create_user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub last_name: String,
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub email: String,
}

/// Payload of `update_user`.
///
/// `id` only routes the request; it is dropped by [`UpdateUser::into_changes`]
/// before anything reaches storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUser {
    #[serde(deserialize_with = "coerce::int")]
    pub id: i32,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub first_name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub last_name: Option<String>,
    #[serde(default)]
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub email: Option<String>,
}

impl UpdateUser {
    /// Strip the routing id, keeping only the fields to overwrite
    pub fn into_changes(self) -> UserChanges {
        UserChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        }
    }
}

/// Fields an update may overwrite. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }

    /// Overwrite the fields present in `self`
    pub fn apply_to(self, user: &mut User) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
    }
}

/// Payload of `find_one_user` and `delete_user`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UserId {
    #[serde(deserialize_with = "coerce::int")]
    pub id: i32,
}

/// Payload of `find_all_users`. Both fields are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Pagination {
    #[serde(default, deserialize_with = "coerce::optional_int")]
    #[validate(range(min = 1, message = "must be a positive number"))]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "coerce::optional_int")]
    #[validate(range(min = 1, message = "must be a positive number"))]
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Rows to skip before the requested page, `None` on overflow
    pub fn offset(&self) -> Option<u64> {
        let page = u64::try_from(self.page()).ok()?;
        let limit = u64::try_from(self.limit()).ok()?;
        page.checked_sub(1)?.checked_mul(limit)
    }
}

/// One page of results plus the numbers needed to walk the rest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub metadata: PageMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub page: i64,
    pub limit: i64,
    /// Rows matching the query across all pages
    pub total_rows: u64,
    /// `ceil(total_rows / limit)`, zero when nothing matches
    pub last_page: u64,
}

impl PageMetadata {
    /// `limit` must be positive; validated pagination guarantees it
    pub fn new(page: i64, limit: i64, total_rows: u64) -> Self {
        let per_page = limit.max(1) as u64;
        Self {
            page,
            limit,
            total_rows,
            last_page: total_rows.div_ceil(per_page),
        }
    }
}

/// Integer fields accept either a JSON integer or a string holding one,
/// matching what existing callers send.
pub(crate) mod coerce {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Float(f64),
        Str(String),
    }

    /// Whole numbers written as floats (`2.0`, `"2.0"`, `1e2`) count as integers
    fn integral(f: f64) -> Option<i64> {
        let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
        (f.fract() == 0.0 && in_range).then_some(f as i64)
    }

    fn to_i64<E: Error>(raw: IntOrString) -> Result<i64, E> {
        match raw {
            IntOrString::Int(n) => Ok(n),
            IntOrString::Float(f) => {
                integral(f).ok_or_else(|| E::custom(format!("expected an integer, found {}", f)))
            }
            IntOrString::Str(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse()
                    .ok()
                    .or_else(|| trimmed.parse().ok().and_then(integral))
                    .ok_or_else(|| E::custom(format!("expected an integer, found \"{}\"", s)))
            }
        }
    }

    fn untagged<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<IntOrString>, D::Error> {
        Option::<IntOrString>::deserialize(deserializer)
            .map_err(|_| D::Error::custom("expected an integer"))
    }

    pub fn optional_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        untagged(deserializer)?.map(to_i64).transpose()
    }

    pub fn int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64>,
    {
        let raw = untagged(deserializer)?.ok_or_else(|| D::Error::custom("expected an integer"))?;
        let value = to_i64(raw)?;
        T::try_from(value).map_err(|_| D::Error::custom(format!("integer {} is out of range", value)))
    }
}
