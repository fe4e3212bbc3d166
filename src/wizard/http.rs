use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    dto::{
        doctors::{DoctorLookup, PublicConfig},
        payments::{CheckoutRequest, PaymentIntentCreated, PaymentRecorded, RecordPaymentRequest},
    },
    wizard::checkout::{CheckoutBackend, CheckoutError},
};

/// [`CheckoutBackend`] over the JSON API served by this crate.
#[derive(Debug, Clone)]
pub struct HttpCheckoutBackend {
    base_url: Url,
    http: Client,
}

impl HttpCheckoutBackend {
    pub fn new(base_url: &str) -> Result<Self, CheckoutError> {
        let base_url =
            Url::parse(base_url).map_err(|err| CheckoutError::InvalidBaseUrl(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(CheckoutError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            http: Client::new(),
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, CheckoutError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CheckoutError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Reads the `{ success, message, ...data }` envelope.
async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, CheckoutError> {
    let status = response.status();
    let body = response.bytes().await?;
    decode_envelope(status, &body)
}

/// A body that is not JSON (proxy pages, plain-text limits) is reported with
/// its status rather than as a transport failure.
fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<T, CheckoutError> {
    let failed = || CheckoutError::Rejected(format!("Request failed with status {status}"));
    let Ok(body) = serde_json::from_slice::<Value>(body) else {
        return Err(failed());
    };

    let succeeded = body.get("success").and_then(Value::as_bool).unwrap_or(false);
    if !status.is_success() || !succeeded {
        return Err(body
            .get("error")
            .and_then(Value::as_str)
            .map(|message| CheckoutError::Rejected(message.to_string()))
            .unwrap_or_else(failed));
    }

    serde_json::from_value(body).map_err(|err| CheckoutError::Rejected(err.to_string()))
}

#[async_trait]
impl CheckoutBackend for HttpCheckoutBackend {
    async fn lookup_doctor(&self, code: &str) -> Result<Option<DoctorLookup>, CheckoutError> {
        let url = self.url(&["api", "doctors", code.trim()])?;
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_envelope(response).await.map(Some)
    }

    async fn publishable_key(&self) -> Result<String, CheckoutError> {
        let url = self.url(&["api", "config"])?;
        let response = self.http.get(url).send().await?;
        let config: PublicConfig = read_envelope(response).await?;
        Ok(config.publishable_key)
    }

    async fn create_payment_intent(
        &self,
        request: &CheckoutRequest,
    ) -> Result<PaymentIntentCreated, CheckoutError> {
        let url = self.url(&["api", "payments", "intent"])?;
        let response = self.http.post(url).json(request).send().await?;
        read_envelope(response).await
    }

    async fn record_payment_success(
        &self,
        request: &RecordPaymentRequest,
    ) -> Result<PaymentRecorded, CheckoutError> {
        let url = self.url(&["api", "payments", "success"])?;
        let response = self.http.post(url).json(request).send().await?;
        read_envelope(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_path_encoded() {
        let backend = HttpCheckoutBackend::new("http://localhost:3000/").unwrap();
        let url = backend.url(&["api", "doctors", "DV1/../x"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/doctors/DV1%2F..%2Fx");
    }

    #[test]
    fn plain_text_error_reports_status() {
        let err = decode_envelope::<PublicConfig>(
            StatusCode::PAYLOAD_TOO_LARGE,
            b"length limit exceeded",
        )
        .unwrap_err();
        assert!(matches!(err, CheckoutError::Rejected(_)));
        assert_eq!(
            err.to_string(),
            "Request failed with status 413 Payload Too Large"
        );
    }

    #[test]
    fn error_envelope_message_is_kept() {
        let err = decode_envelope::<PublicConfig>(
            StatusCode::BAD_REQUEST,
            br#"{"success":false,"error":"Your card was declined."}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Your card was declined.");
    }

    #[test]
    fn success_envelope_is_flattened() {
        let config: PublicConfig = decode_envelope(
            StatusCode::OK,
            br#"{"success":true,"message":"Config","publishableKey":"pk_test"}"#,
        )
        .unwrap();
        assert_eq!(config.publishable_key, "pk_test");
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(HttpCheckoutBackend::new("not a url").is_err());
        assert!(HttpCheckoutBackend::new("mailto:x@y.z").is_err());
    }
}
