use rand::Rng;

/// Generate a 6-digit OTP code, zero-padded, uniform over [0, 999999]
pub fn generate_otp_code() -> String {
    let mut rng = rand::rng();
    let code: u32 = rng.random_range(0..1_000_000);
    format!("{:06}", code)
}

/// OTP expiration time in minutes
pub const OTP_EXPIRATION_MINUTES: i64 = 15;
