//! Input validation rules for registration

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

pub const NAME_TOO_SHORT: &str = "Nome deve conter no mínimo 3 caracteres";
pub const NAME_TOO_LONG: &str = "Nome deve conter no máximo 100 caracteres";
pub const EMAIL_INVALID: &str = "Seu email deve ser válido";
pub const NAME_RESERVED: &str = "Este nome não está disponível";
pub const PASSWORD_RULE: &str = "A senha deve conter pelo menos uma letra maiúscula, um dígito, um caractere especial e ter pelo menos 8 caracteres";

// The registration pattern is `^(?=.*\d)(?=.*[a-z])(?=.*[A-Z])(?=.*[a-zA-Z]).{8,}$`.
// The regex crate has no lookahead, so each lookahead is its own search and
// the anchored body is matched separately. Hardcoded patterns, always valid.
static HAS_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]").expect("hardcoded digit regex is invalid"));
static HAS_LOWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z]").expect("hardcoded lowercase regex is invalid"));
static HAS_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]").expect("hardcoded uppercase regex is invalid"));
static HAS_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]").expect("hardcoded letter regex is invalid"));
// `.` in the registration pattern stops at any of the four line terminators
static SINGLE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\n\r\x{2028}\x{2029}]*$").expect("hardcoded line regex is invalid")
});

/// Names that would collide with fixed top-level routes under `/{username}`
pub const RESERVED_NAMES: &[&str] = &[
    "api", "comments", "feed", "login", "logout", "metrics", "posts", "recent", "register",
];

/// Lengths are counted in UTF-16 code units, as the browser-side form does
fn utf16_len(value: &str) -> usize {
    value.encode_utf16().count()
}

/// Password pattern check.
///
/// Requires a digit, a lower-case letter, an upper-case letter and at least
/// 8 UTF-16 units with no line terminator. The fourth lookahead only
/// re-checks for a letter: no special character is required.
pub fn password_matches_pattern(password: &str) -> bool {
    HAS_DIGIT.is_match(password)
        && HAS_LOWER.is_match(password)
        && HAS_UPPER.is_match(password)
        && HAS_LETTER.is_match(password)
        && SINGLE_LINE.is_match(password)
        && utf16_len(password) >= 8
}

/// validator crate compatible custom validator for the whole name rule:
/// 3..=100 long and not one of [`RESERVED_NAMES`]
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    validate_name_length(name)?;

    if RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
    {
        let mut err = ValidationError::new("name_reserved");
        err.message = Some(Cow::Borrowed(NAME_RESERVED));
        return Err(err);
    }
    Ok(())
}

pub fn validate_name_length(name: &str) -> Result<(), ValidationError> {
    let len = utf16_len(name);
    let (code, message) = if len < 3 {
        ("name_too_short", NAME_TOO_SHORT)
    } else if len > 100 {
        ("name_too_long", NAME_TOO_LONG)
    } else {
        return Ok(());
    };

    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    Err(err)
}

/// validator crate compatible custom validator for the password pattern
pub fn validate_password_pattern(password: &str) -> Result<(), ValidationError> {
    if password_matches_pattern(password) {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_pattern");
        err.message = Some(Cow::Borrowed(PASSWORD_RULE));
        Err(err)
    }
}
