use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::reset::model::{ForgotPasswordRequest, ResetPasswordRequest};
use crate::reset::service::PasswordResetService;
use crate::utils::error::CustomError;

pub async fn forgot_password(
    reset_service: web::Data<PasswordResetService>,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, CustomError> {
    reset_service.request_otp(&body.email).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "OTP sent."
    })))
}

pub async fn reset_password(
    reset_service: web::Data<PasswordResetService>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, CustomError> {
    reset_service
        .reset_password(&body.email, &body.otp, &body.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password reset successful."
    })))
}
