use crate::token::error::IdentifierError;

/// Team and key identifiers are always this many characters.
pub const IDENTIFIER_LEN: usize = 10;

/// Check a team or key identifier: exactly ten characters of `[0-9A-Z]`.
///
/// Length is reported before any character problem.
pub fn validate_identifier(candidate: &str) -> Result<(), IdentifierError> {
    let actual = candidate.chars().count();
    if actual != IDENTIFIER_LEN {
        return Err(IdentifierError::WrongLength {
            expected: IDENTIFIER_LEN,
            actual,
        });
    }

    match candidate
        .chars()
        .enumerate()
        .find(|(_, c)| !(c.is_ascii_uppercase() || c.is_ascii_digit()))
    {
        Some((position, character)) => Err(IdentifierError::DisallowedCharacter { character, position }),
        None => Ok(()),
    }
}
