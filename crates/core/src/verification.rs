use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::carrier::{CarrierVerification, McNumber};

/// Looks a carrier up in the motor-carrier registry.
///
/// Implementations never fail: transport problems and non-active
/// authority both come back as `valid = false`, with `error` set only
/// when the registry could not be reached.
#[async_trait]
pub trait CarrierVerifier: Send + Sync {
    async fn verify(&self, mc_number: &McNumber) -> CarrierVerification;
}

/// Fixed answers keyed by MC number; anything unknown is rejected.
#[derive(Clone, Debug, Default)]
pub struct StaticCarrierVerifier {
    answers: HashMap<String, CarrierVerification>,
}

impl StaticCarrierVerifier {
    pub fn with_active(mut self, mc_number: &str, carrier_name: &str) -> Self {
        self.answers.insert(mc_number.to_owned(), CarrierVerification::active(carrier_name, "A"));
        self
    }

    pub fn with_answer(mut self, mc_number: &str, answer: CarrierVerification) -> Self {
        self.answers.insert(mc_number.to_owned(), answer);
        self
    }
}

#[async_trait]
impl CarrierVerifier for StaticCarrierVerifier {
    async fn verify(&self, mc_number: &McNumber) -> CarrierVerification {
        self.answers.get(mc_number.as_str()).cloned().unwrap_or_else(CarrierVerification::rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::{CarrierVerifier, StaticCarrierVerifier};
    use crate::domain::carrier::{CarrierVerification, McNumber};

    #[tokio::test]
    async fn static_verifier_answers_known_numbers_only() {
        let verifier = StaticCarrierVerifier::default()
            .with_active("123456", "Acme Trucking")
            .with_answer("500", CarrierVerification::unavailable("registry down"));

        let known = verifier.verify(&McNumber("123456".to_string())).await;
        assert!(known.valid);
        assert_eq!(known.carrier_name.as_deref(), Some("Acme Trucking"));

        let down = verifier.verify(&McNumber("500".to_string())).await;
        assert!(!down.valid);
        assert!(down.error.is_some());

        let unknown = verifier.verify(&McNumber("1".to_string())).await;
        assert_eq!(unknown, CarrierVerification::rejected());
    }
}
