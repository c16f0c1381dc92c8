use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use crate::ports;
use crate::ports::push::SendError;
use crate::push::VapidKeys;
use crate::types::Subscription;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidKeys,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidKeys) -> Result<Self, web_push::WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }
}

/// Relay 404/410 both mean the endpoint is permanently gone and the stored
/// subscription is worthless.
fn classify(err: web_push::WebPushError) -> SendError {
    match err {
        web_push::WebPushError::EndpointNotFound | web_push::WebPushError::EndpointNotValid => {
            SendError::EndpointGone
        }
        other => SendError::Failed(other.to_string()),
    }
}

impl ports::PushSender for WebPushSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), SendError>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, message: &'a str) -> Self::Fut<'a> {
        Box::pin(async move {
            let subscription_info = web_push::SubscriptionInfo::new(
                subscription.endpoint.clone(),
                subscription.p256dh.clone(),
                subscription.auth.clone(),
            );
            let result: Result<(), web_push::WebPushError> = async {
                let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
                builder.set_payload(web_push::ContentEncoding::Aes128Gcm, message.as_bytes());
                let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
                    &self.vapid.private_key,
                    web_push::URL_SAFE_NO_PAD,
                    &subscription_info,
                )?;
                signature_builder.add_claim("sub", self.vapid.subject.as_str());
                builder.set_vapid_signature(signature_builder.build()?);
                self.client.send(builder.build()?).await?;
                Ok(())
            }
            .await;
            result.map_err(classify)
        })
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn classify__should_mark_gone_endpoints_only() {
        // Then
        assert_eq!(
            classify(web_push::WebPushError::EndpointNotFound),
            SendError::EndpointGone
        );
        assert_eq!(
            classify(web_push::WebPushError::EndpointNotValid),
            SendError::EndpointGone
        );
        assert!(matches!(
            classify(web_push::WebPushError::Unauthorized),
            SendError::Failed(_)
        ));
        assert!(matches!(
            classify(web_push::WebPushError::PayloadTooLarge),
            SendError::Failed(_)
        ));
    }
}
