//! Field validation shared by the dialogue engine and the HTTP boundary.

use crate::db::NewUser;
use crate::error::FieldError;
use chrono::NaiveDate;

pub const NAME_MAX_CHARS: usize = 100;
pub const USERNAME_MAX_CHARS: usize = 255;
pub const PASSWORD_MAX_BYTES: usize = 1024;

/// Earliest selectable birthdate.
pub fn min_birthdate() -> NaiveDate {
    NaiveDate::from_ymd_opt(1920, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Validate a personal name field (name or surname). Returns the trimmed value.
pub fn validate_name(field: &'static str, raw: &str) -> Result<String, FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(FieldError::Empty { field });
    }
    if value.chars().count() > NAME_MAX_CHARS {
        return Err(FieldError::TooLong {
            field,
            max: NAME_MAX_CHARS,
        });
    }
    Ok(value.to_string())
}

/// Validate a username. Returns the trimmed value.
pub fn validate_username(raw: &str) -> Result<String, FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(FieldError::Empty { field: "username" });
    }
    if value.chars().count() > USERNAME_MAX_CHARS {
        return Err(FieldError::TooLong {
            field: "username",
            max: USERNAME_MAX_CHARS,
        });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(FieldError::UsernameWhitespace);
    }
    Ok(value.to_string())
}

/// Validate a plaintext password. Passwords are never trimmed.
pub fn validate_password(raw: &str) -> Result<(), FieldError> {
    if raw.is_empty() {
        return Err(FieldError::Empty { field: "password" });
    }
    if raw.len() > PASSWORD_MAX_BYTES {
        return Err(FieldError::TooLong {
            field: "password",
            max: PASSWORD_MAX_BYTES,
        });
    }
    Ok(())
}

/// Birthdates must fall in `[min_birthdate(), today]`.
pub fn validate_birthdate(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, FieldError> {
    if date < min_birthdate() || date > today {
        return Err(FieldError::DateOutOfRange(date));
    }
    Ok(date)
}

/// Parse a typed `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, FieldError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| FieldError::MalformedDate(raw.to_string()))
}

/// Validate and normalize a complete registration.
pub fn validate_new_user(user: NewUser, today: NaiveDate) -> Result<NewUser, FieldError> {
    Ok(NewUser {
        identity: user.identity,
        name: validate_name("name", &user.name)?,
        surname: validate_name("surname", &user.surname)?,
        birthdate: validate_birthdate(user.birthdate, today)?,
        username: validate_username(&user.username)?,
        role: user.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_name_trimmed_and_bounded() {
        assert_eq!(validate_name("name", "  Ana ").unwrap(), "Ana");
        assert_eq!(
            validate_name("surname", "   "),
            Err(FieldError::Empty { field: "surname" })
        );
        let long = "x".repeat(NAME_MAX_CHARS + 1);
        assert!(matches!(
            validate_name("name", &long),
            Err(FieldError::TooLong { .. })
        ));
    }

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username(" ana ").unwrap(), "ana");
        assert_eq!(
            validate_username("ana lee"),
            Err(FieldError::UsernameWhitespace)
        );
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_password_not_trimmed() {
        assert!(validate_password(" ").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"p".repeat(PASSWORD_MAX_BYTES + 1)).is_err());
    }

    #[test]
    fn test_birthdate_bounds() {
        assert!(validate_birthdate(min_birthdate(), today()).is_ok());
        assert!(validate_birthdate(today(), today()).is_ok());
        assert!(validate_birthdate(today().succ_opt().unwrap(), today()).is_err());
        assert!(validate_birthdate(NaiveDate::from_ymd_opt(1919, 12, 31).unwrap(), today()).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2000-01-01").unwrap(),
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
        );
        assert!(matches!(parse_date("2000-02-30"), Err(FieldError::MalformedDate(_))));
        assert!(parse_date("yesterday").is_err());
    }
}
