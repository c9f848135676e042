use crate::errors::HabitError;

pub const OTP_LEN: usize = 6;

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, HabitError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HabitError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

pub fn validate_login<'a>(
    email: &'a str,
    password: &'a str,
) -> Result<(&'a str, &'a str), HabitError> {
    let email = required(email, "Email")?;
    required(password, "Password")?;
    Ok((email, password))
}

pub fn validate_signup<'a>(
    name: &'a str,
    email: &'a str,
    password: &'a str,
) -> Result<(&'a str, &'a str, &'a str), HabitError> {
    let name = required(name, "Name")?;
    let email = required(email, "Email")?;
    required(password, "Password")?;
    Ok((name, email, password))
}

pub fn validate_email(email: &str) -> Result<&str, HabitError> {
    required(email, "Email")
}

pub fn validate_otp(otp: &str) -> Result<&str, HabitError> {
    let otp = otp.trim();
    if otp.is_empty() {
        return Err(HabitError::validation("Please enter the OTP code"));
    }
    if otp.len() != OTP_LEN || !otp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HabitError::validation(format!("OTP must be {OTP_LEN} digits")));
    }
    Ok(otp)
}

pub fn validate_reset(new_password: &str, confirm_password: &str) -> Result<(), HabitError> {
    required(new_password, "New password")?;
    if new_password != confirm_password {
        return Err(HabitError::validation("Passwords do not match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_must_be_six_digits() {
        assert_eq!(validate_otp(" 123456 ").unwrap(), "123456");
        assert!(validate_otp("").is_err());
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("1234567").is_err());
        assert!(validate_otp("12a456").is_err());
    }

    #[test]
    fn reset_requires_matching_passwords() {
        assert!(validate_reset("hunter22", "hunter22").is_ok());
        assert!(validate_reset("hunter22", "hunter23").is_err());
        assert!(validate_reset("  ", "  ").is_err());
    }

    #[test]
    fn signup_requires_every_field() {
        assert!(validate_signup("Ada", "ada@example.com", "pw").is_ok());
        let err = validate_signup("Ada", " ", "pw").unwrap_err();
        assert_eq!(err.to_string(), "Email is required");
    }

    #[test]
    fn login_keeps_password_untrimmed() {
        let (email, password) = validate_login(" ada@example.com ", " pw ").unwrap();
        assert_eq!(email, "ada@example.com");
        assert_eq!(password, " pw ");
    }
}
