//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Minisign verification (spec §4.6.1): a minimal, from-scratch reading of
//! the minisign text/binary envelope rather than a dependency on the
//! `minisign` crate, since the crate has no stable no-signing-only API.

use base64::{engine::general_purpose::STANDARD, Engine};
use blake2::Digest as Blake2Digest;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::{Result, VouchError};

fn fail(msg: impl Into<String>) -> VouchError {
    VouchError::MinisignVerifyFailed(msg.into())
}

struct PublicKey {
    alg: [u8; 2],
    key_id: [u8; 8],
    verifying_key: VerifyingKey,
}

fn decode_b64_line(line: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(line.trim())
        .map_err(|e| fail(format!("bad base64 encoding: {e}")))
}

/// Public key must be the minisign textual form: first line
/// `untrusted comment:` header, second line base64 key blob.
fn parse_public_key(text: &str) -> Result<PublicKey> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let first = lines.next().ok_or_else(|| fail("empty public key"))?;
    if !first.starts_with("untrusted comment:") {
        return Err(fail("bad key encoding: missing untrusted comment header"));
    }
    let second = lines
        .next()
        .ok_or_else(|| fail("bad key encoding: missing key line"))?;
    let blob = decode_b64_line(second)?;
    if blob.len() != 42 {
        return Err(fail("bad key encoding: unexpected key blob length"));
    }
    let alg = [blob[0], blob[1]];
    if alg != *b"Ed" {
        return Err(fail("bad key encoding: unsupported key algorithm"));
    }
    let mut key_id = [0u8; 8];
    key_id.copy_from_slice(&blob[2..10]);
    let mut pk_bytes = [0u8; 32];
    pk_bytes.copy_from_slice(&blob[10..42]);
    let verifying_key =
        VerifyingKey::from_bytes(&pk_bytes).map_err(|_| fail("bad key encoding: invalid ed25519 point"))?;
    Ok(PublicKey {
        alg,
        key_id,
        verifying_key,
    })
}

struct ParsedSignature {
    alg: [u8; 2],
    key_id: [u8; 8],
    signature: [u8; 64],
    trusted_comment: Option<String>,
    global_signature: Option<[u8; 64]>,
    signature_blob_b64: String,
}

fn parse_signature(text: &str) -> Result<ParsedSignature> {
    let lines: Vec<&str> = text.lines().collect();
    let mut iter = lines.iter();

    let first = iter
        .next()
        .ok_or_else(|| fail("bad signature encoding: empty signature file"))?;
    if !first.starts_with("untrusted comment:") {
        return Err(fail(
            "bad signature encoding: missing untrusted comment header",
        ));
    }
    let sig_line = iter
        .next()
        .ok_or_else(|| fail("bad signature encoding: missing signature line"))?;
    let blob = decode_b64_line(sig_line)?;
    if blob.len() != 74 {
        return Err(fail(
            "bad signature encoding: unexpected signature blob length",
        ));
    }
    let alg = [blob[0], blob[1]];
    let mut key_id = [0u8; 8];
    key_id.copy_from_slice(&blob[2..10]);
    let mut signature = [0u8; 64];
    signature.copy_from_slice(&blob[10..74]);

    let trusted_comment_line = iter.next();
    let global_sig_line = iter.next();

    let (trusted_comment, global_signature) = match (trusted_comment_line, global_sig_line) {
        (Some(tc), Some(gs)) if tc.starts_with("trusted comment:") => {
            let comment = tc.trim_start_matches("trusted comment:").trim().to_string();
            let gs_bytes = decode_b64_line(gs)?;
            if gs_bytes.len() != 64 {
                return Err(fail(
                    "bad signature encoding: unexpected global signature length",
                ));
            }
            let mut arr = [0u8; 64];
            arr.copy_from_slice(&gs_bytes);
            (Some(comment), Some(arr))
        }
        _ => (None, None),
    };

    Ok(ParsedSignature {
        alg,
        key_id,
        signature,
        trusted_comment,
        global_signature,
        signature_blob_b64: sig_line.trim().to_string(),
    })
}

/// Verifies `content` against `sig_text` using `public_key_text` (minisign
/// textual forms for both key and signature).
pub fn verify_minisign(content: &[u8], sig_text: &str, public_key_text: &str) -> Result<()> {
    let pk = parse_public_key(public_key_text)?;
    let sig = parse_signature(sig_text)?;

    if sig.alg != pk.alg {
        return Err(fail("signature/key mismatch: algorithm mismatch"));
    }
    if sig.key_id != pk.key_id {
        return Err(fail("signature/key mismatch: key id mismatch"));
    }

    let message: Vec<u8> = match &sig.alg {
        b"Ed" => content.to_vec(),
        b"ED" => {
            let mut hasher = blake2::Blake2b512::new();
            hasher.update(content);
            hasher.finalize().to_vec()
        }
        _ => return Err(fail("bad signature encoding: unsupported signature algorithm")),
    };

    let signature = Signature::from_bytes(&sig.signature);
    pk.verifying_key
        .verify(&message, &signature)
        .map_err(|_| fail("signature/key mismatch"))?;

    // Trusted comments are themselves signed; round-trip them through the
    // global signature so a tampered comment is rejected too.
    if let (Some(trusted_comment), Some(global_sig)) = (&sig.trusted_comment, &sig.global_signature) {
        let mut signed = decode_b64_line(&sig.signature_blob_b64)?;
        signed.extend_from_slice(trusted_comment.as_bytes());
        let global_signature = Signature::from_bytes(global_sig);
        pk.verifying_key
            .verify(&signed, &global_signature)
            .map_err(|_| fail("signature/key mismatch: trusted comment tampered"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    fn keypair() -> SigningKey {
        SigningKey::generate(&mut OsRng)
    }

    fn encode_public_key(signing: &SigningKey) -> String {
        let mut blob = Vec::with_capacity(42);
        blob.extend_from_slice(b"Ed");
        blob.extend_from_slice(&[0u8; 8]);
        blob.extend_from_slice(signing.verifying_key().as_bytes());
        format!(
            "untrusted comment: test key\n{}\n",
            STANDARD.encode(blob)
        )
    }

    fn sign(signing: &SigningKey, content: &[u8]) -> String {
        let sig = signing.sign(content);
        let mut blob = Vec::with_capacity(74);
        blob.extend_from_slice(b"Ed");
        blob.extend_from_slice(&[0u8; 8]);
        blob.extend_from_slice(&sig.to_bytes());
        format!("untrusted comment: test sig\n{}\n", STANDARD.encode(blob))
    }

    #[test]
    fn valid_signature_verifies() {
        let signing = keypair();
        let content = b"hello world";
        let sig = sign(&signing, content);
        let pk = encode_public_key(&signing);
        verify_minisign(content, &sig, &pk).unwrap();
    }

    #[test]
    fn flipped_content_bit_fails() {
        let signing = keypair();
        let sig = sign(&signing, b"hello world");
        let pk = encode_public_key(&signing);
        let err = verify_minisign(b"Hello world", &sig, &pk).unwrap_err();
        assert!(matches!(err, VouchError::MinisignVerifyFailed(_)));
    }

    #[test]
    fn wrong_key_fails() {
        let signing = keypair();
        let other = keypair();
        let content = b"hello world";
        let sig = sign(&signing, content);
        let pk = encode_public_key(&other);
        assert!(verify_minisign(content, &sig, &pk).is_err());
    }

    #[test]
    fn tampered_signature_bytes_fail() {
        let signing = keypair();
        let content = b"hello world";
        let sig = sign(&signing, content);

        // Flip the leading character of the base64 signature line itself,
        // rather than appending after it, so the decoded signature bytes are
        // genuinely different instead of the line being left untouched.
        let mut lines: Vec<String> = sig.lines().map(str::to_string).collect();
        let sig_line = lines.get_mut(1).expect("signature has a base64 line");
        let first = sig_line.chars().next().expect("base64 line is non-empty");
        let replacement = if first == 'A' { 'B' } else { 'A' };
        sig_line.replace_range(0..1, &replacement.to_string());
        let tampered = format!("{}\n", lines.join("\n"));

        let pk = encode_public_key(&signing);
        assert!(verify_minisign(content, &tampered, &pk).is_err());
    }
}
