use std::{
    cell::Cell,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use actix_web::{error::PayloadError, web::Bytes};
use futures_core::Stream;

pub(crate) type LocalBoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + 'a>>;

/// Records whether a [`Limit`] stream gave up on its input
#[derive(Clone, Debug, Default)]
pub(crate) struct Exceeded(Rc<Cell<bool>>);

impl Exceeded {
    pub(crate) fn get(&self) -> bool {
        self.0.get()
    }
}

/// Fails with [`PayloadError::Overflow`] once more than `limit` bytes have passed through
pub(crate) struct Limit<S> {
    inner: Option<S>,
    seen: u64,
    limit: u64,
    exceeded: Exceeded,
}

pub(crate) fn limit<S>(inner: S, limit: u64) -> (Limit<S>, Exceeded) {
    let exceeded = Exceeded::default();

    (
        Limit {
            inner: Some(inner),
            seen: 0,
            limit,
            exceeded: exceeded.clone(),
        },
        exceeded,
    )
}

impl<S> Stream for Limit<S>
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin,
{
    type Item = Result<Bytes, PayloadError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.as_mut().get_mut();

        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match Pin::new(inner).poll_next(cx) {
            Poll::Ready(Some(Ok(bytes))) => {
                this.seen += bytes.len() as u64;

                if this.seen > this.limit {
                    this.inner.take();
                    this.exceeded.0.set(true);

                    return Poll::Ready(Some(Err(PayloadError::Overflow)));
                }

                Poll::Ready(Some(Ok(bytes)))
            }
            Poll::Ready(None) => {
                this.inner.take();
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{error::PayloadError, web::Bytes};
    use futures_util::{stream, StreamExt};

    fn chunks(sizes: &[usize]) -> impl futures_core::Stream<Item = Result<Bytes, PayloadError>> + Unpin {
        stream::iter(
            sizes
                .iter()
                .map(|size| Ok(Bytes::from(vec![0u8; *size])))
                .collect::<Vec<_>>(),
        )
    }

    #[actix_web::test]
    async fn passes_through_under_limit() {
        let (mut limited, exceeded) = super::limit(chunks(&[4, 4, 2]), 10);

        let mut total = 0;
        while let Some(res) = limited.next().await {
            total += res.expect("Within limit").len();
        }

        assert_eq!(total, 10);
        assert!(!exceeded.get());
    }

    #[actix_web::test]
    async fn fails_over_limit() {
        let (mut limited, exceeded) = super::limit(chunks(&[4, 4, 4, 4]), 10);

        assert!(limited.next().await.expect("Chunk").is_ok());
        assert!(limited.next().await.expect("Chunk").is_ok());
        assert!(matches!(
            limited.next().await,
            Some(Err(PayloadError::Overflow))
        ));
        assert!(limited.next().await.is_none());
        assert!(exceeded.get());
    }
}
