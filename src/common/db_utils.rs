use crate::common::error::AppError;

// ---
// Helper: traduz violação de unicidade do Postgres em Conflict
// ---
/// Os nomes vêm das constraints da migration inicial.
pub(crate) fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_key") => {
                    AppError::Conflict("Este e-mail já está em uso.".into())
                }
                Some("users_cpf_key") => {
                    AppError::Conflict("Este CPF já está cadastrado.".into())
                }
                Some("companies_slug_key") => {
                    AppError::Conflict("Este slug já está em uso.".into())
                }
                // Fallback (caso adicione outras chaves únicas no futuro)
                Some(other) => AppError::Conflict(format!("Registro duplicado ({}).", other)),
                None => AppError::Conflict("Registro duplicado.".into()),
            };
        }
    }
    e.into()
}

// ---
// Helper: traduz violação de chave estrangeira em NotFound
// ---
pub(crate) fn map_missing_parent(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return match db_err.constraint() {
                Some("products_category_id_fkey") => AppError::NotFound("Categoria"),
                _ => AppError::NotFound("Loja"),
            };
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_stay_store_failures() {
        let err = map_unique_violation(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::StoreUnavailable(_)));

        let err = map_missing_parent(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }
}
