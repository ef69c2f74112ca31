use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::common::response::ApiResponse;

// Mensagem única para "não existe" e "não é seu": não revela qual dos dois aconteceu.
pub const NOT_FOUND_OR_DENIED: &str = "Registro não encontrado ou acesso negado.";

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Violação de unicidade (slug, cpf, e-mail)
    #[error("{0}")]
    Conflict(String),

    #[error("Registro não encontrado ou acesso negado.")]
    Forbidden,

    #[error("Não autorizado")]
    Unauthorized,

    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    // Qualquer falha do sqlx (conexão, timeout, query) chega aqui pelo `?`
    #[error("Banco de dados indisponível")]
    StoreUnavailable(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError(_) | AppError::BcryptError(_) | AppError::JwtError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// O texto que vai para o cliente. Erros internos nunca vazam detalhes.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => "Um ou mais campos são inválidos.".to_string(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Forbidden => NOT_FOUND_OR_DENIED.to_string(),
            AppError::Unauthorized => "Token de autenticação inválido ou ausente.".to_string(),
            AppError::InvalidCredentials => "E-mail ou senha inválidos.".to_string(),
            AppError::NotFound(what) => format!("{} não encontrado(a).", what),
            AppError::StoreUnavailable(_) => "Serviço temporariamente indisponível.".to_string(),
            _ => "Ocorreu um erro inesperado.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiResponse::<()>::failure(self.public_message()).with_details(details)
            }
            // O `tracing` loga a mensagem detalhada; o cliente recebe a genérica.
            AppError::StoreUnavailable(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => {
                tracing::error!("Erro Interno do Servidor: {:?}", self);
                ApiResponse::<()>::failure(self.public_message())
            }
            _ => ApiResponse::<()>::failure(self.public_message()),
        };

        (status, Json(body)).into_response()
    }
}
