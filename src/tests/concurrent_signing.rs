// Many request paths share one provider token:
//  - simultaneous callers all observe one signature per freshness window
//  - the cached token always matches its issue time
//  - key replacement racing with signing never hands out a torn token

#[cfg(test)]
mod test {

    use std::sync::{Arc, Barrier};
    use std::thread;

    use crate::tests::common::{loaded_token, other_key, test_key};
    use crate::token::jwt::{self, decode_unverified};

    const CALLERS: usize = 32;

    #[test]
    fn simultaneous_callers_share_one_signature() {
        let token = Arc::new(loaded_token());
        let barrier = Arc::new(Barrier::new(CALLERS));

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let token = token.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    token.signed_token().unwrap()
                })
            })
            .collect();

        let tokens: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(tokens.windows(2).all(|w| w[0] == w[1]));

        let cached = token.cached().unwrap();
        assert_eq!(cached.value, tokens[0]);
        let (_, claims) = decode_unverified(&cached.value).unwrap();
        assert_eq!(claims.iat, cached.issued_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn async_request_paths_share_one_signature() {
        let token = Arc::new(loaded_token());

        let tasks: Vec<_> = (0..CALLERS)
            .map(|_| {
                let token = token.clone();
                tokio::spawn(async move { token.signed_token().unwrap() })
            })
            .collect();

        let mut tokens = Vec::with_capacity(CALLERS);
        for task in tasks {
            tokens.push(task.await.unwrap());
        }
        assert!(tokens.iter().all(|t| t == &tokens[0]));
    }

    #[test]
    fn key_replacement_racing_with_signing() {
        let token = Arc::new(loaded_token());
        let a = test_key();
        let b = other_key();
        let barrier = Arc::new(Barrier::new(CALLERS + 1));

        let signers: Vec<_> = (0..CALLERS)
            .map(|i| {
                let token = token.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let mut seen = Vec::new();
                    for n in 0..20 {
                        if (i + n) % 7 == 0 {
                            token.invalidate();
                        }
                        seen.push(token.signed_token().unwrap());
                    }
                    seen
                })
            })
            .collect();

        let swapper = {
            let token = token.clone();
            let barrier = barrier.clone();
            let (a, b) = (a.clone(), b.clone());
            thread::spawn(move || {
                barrier.wait();
                for n in 0..20 {
                    token.install_key(if n % 2 == 0 { b.clone() } else { a.clone() });
                }
            })
        };

        swapper.join().unwrap();
        for signer in signers {
            for signed in signer.join().unwrap() {
                // every token handed out was signed by one of the two keys
                let by_a = jwt::verify(&signed, a.verifying_key()).is_ok();
                let by_b = jwt::verify(&signed, b.verifying_key()).is_ok();
                assert!(by_a || by_b);
            }
        }

        // the final cache entry is consistent with itself and the current key
        let current = token.signed_token().unwrap();
        let cached = token.cached().unwrap();
        assert_eq!(cached.value, current);
        let verified = jwt::verify(&current, &token.verifying_key().unwrap()).unwrap();
        assert_eq!(verified.claims.iat, cached.issued_at);
    }
}
