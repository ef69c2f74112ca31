use validator::ValidationError;

/// Remove tudo que não for dígito ("123.456.789-00" -> "12345678900").
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Nome obrigatório: vazio ou só espaços é rejeitado.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("O nome não pode ficar em branco.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{digits_only, not_blank};

    #[test]
    fn strips_cpf_and_phone_punctuation() {
        assert_eq!(digits_only("123.456.789-00"), "12345678900");
        assert_eq!(digits_only("(11) 99999-8888"), "11999998888");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn whitespace_only_names_are_blank() {
        assert!(not_blank("").is_err());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("\t\n").is_err());
        assert!(not_blank(" Bebidas ").is_ok());
    }
}
