//! The named policy checks from the component design, each modeled as a
//! small struct implementing [`Check`] rather than through inheritance —
//! new checks compose additively into a [`super::engine::PolicyEngine`].

use ksr_ceremony_domain::canonical::bundle_signed_data;
use ksr_ceremony_domain::{AlgorithmParams, Violation};

use super::context::PolicyContext;

pub trait Check {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &PolicyContext) -> Vec<Violation>;
}

fn rsa_params(algorithm: u8, public_key: &[u8]) -> Option<AlgorithmParams> {
    if algorithm != ksr_ceremony_domain::algorithm::ALG_RSA_SHA256 {
        return None;
    }
    // RSA DNSKEY public key encoding: 1-byte exponent length (or 0x00 then
    // 2-byte length for "long form"), then exponent, then modulus.
    if public_key.is_empty() {
        return None;
    }
    let (exp_len, exp_start) = if public_key[0] == 0 {
        if public_key.len() < 3 {
            return None;
        }
        (
            u16::from_be_bytes([public_key[1], public_key[2]]) as usize,
            3,
        )
    } else {
        (public_key[0] as usize, 1)
    };
    let exp_end = exp_start + exp_len;
    if exp_end > public_key.len() {
        return None;
    }
    let exponent_bytes = &public_key[exp_start..exp_end];
    let mut exponent: u64 = 0;
    for b in exponent_bytes {
        exponent = (exponent << 8) | u64::from(*b);
    }
    let modulus_len = public_key.len() - exp_end;
    Some(AlgorithmParams::Rsa {
        size: (modulus_len as u32) * 8,
        exponent,
    })
}

fn ecdsa_params(algorithm: u8, public_key: &[u8]) -> Option<AlgorithmParams> {
    if algorithm != ksr_ceremony_domain::algorithm::ALG_ECDSA_P256_SHA256 {
        return None;
    }
    // The wire encoding is the concatenated `x || y` curve point, so its
    // byte length is twice the field size; "256" in "P-256" names that
    // field size, not the doubled encoding length.
    Some(AlgorithmParams::Ecdsa {
        size: (public_key.len() as u32) * 4,
    })
}

fn key_params(algorithm: u8, public_key: &[u8]) -> Option<AlgorithmParams> {
    rsa_params(algorithm, public_key).or_else(|| ecdsa_params(algorithm, public_key))
}

pub struct AcceptableDomain {
    pub acceptable: Vec<String>,
}

impl Check for AcceptableDomain {
    fn name(&self) -> &'static str {
        "AcceptableDomain"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        if self.acceptable.iter().any(|d| d == &ctx.document.domain) {
            Vec::new()
        } else {
            vec![Violation::new(
                self.name(),
                format!("domain {:?} is not in the acceptable set", ctx.document.domain),
            )]
        }
    }
}

pub struct NumBundles;

impl Check for NumBundles {
    fn name(&self) -> &'static str {
        "NumBundles"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let actual = ctx.document.bundles().len();
        if actual == ctx.config.num_bundles {
            Vec::new()
        } else {
            vec![Violation::new(
                self.name(),
                format!(
                    "expected {} bundles, found {actual}",
                    ctx.config.num_bundles
                ),
            )]
        }
    }
}

/// Checked only against the response: the configured vector describes the
/// fully-assembled SKR (ZSK plus whatever KSKs the schema publishes that
/// slot), which a bare KSR — carrying ZSK material only — cannot match.
pub struct NumKeysPerBundle;

impl Check for NumKeysPerBundle {
    fn name(&self) -> &'static str {
        "NumKeysPerBundle"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        if !ctx.document.body.is_response() {
            return Vec::new();
        }
        let mut violations = Vec::new();
        for (i, bundle) in ctx.document.bundles().iter().enumerate() {
            if let Some(&expected) = ctx.config.num_keys_per_bundle.get(i) {
                if bundle.keys.len() != expected {
                    violations.push(
                        Violation::new(
                            self.name(),
                            format!(
                                "slot {} expected {expected} keys, found {}",
                                i + 1,
                                bundle.keys.len()
                            ),
                        )
                        .with_bundle(&bundle.id),
                    );
                }
            }
        }
        violations
    }
}

/// Checked only against the response, for the same reason as
/// [`NumKeysPerBundle`]: the configured count includes the KSKs the
/// schema publishes, which are absent from the bare KSR.
pub struct NumDistinctKeys;

impl Check for NumDistinctKeys {
    fn name(&self) -> &'static str {
        "NumDistinctKeys"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        if !ctx.document.body.is_response() {
            return Vec::new();
        }
        let mut distinct: Vec<&[u8]> = Vec::new();
        for bundle in ctx.document.bundles() {
            for key in &bundle.keys {
                if !distinct.iter().any(|pk| *pk == key.public_key.as_slice()) {
                    distinct.push(&key.public_key);
                }
            }
        }
        if distinct.len() == ctx.config.num_different_keys_in_all_bundles {
            Vec::new()
        } else {
            vec![Violation::new(
                self.name(),
                format!(
                    "expected {} distinct keys across all bundles, found {}",
                    ctx.config.num_different_keys_in_all_bundles,
                    distinct.len()
                ),
            )]
        }
    }
}

/// Every key's declared tag must equal the RFC 4034 Appendix B tag
/// recomputed from its own RDATA. Always on: a wrong tag means the
/// document's self-description cannot be trusted at all.
pub struct CheckKeyTags;

impl Check for CheckKeyTags {
    fn name(&self) -> &'static str {
        "CheckKeyTags"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        for bundle in ctx.document.bundles() {
            for key in &bundle.keys {
                let computed = key.compute_key_tag();
                if computed != key.key_tag {
                    violations.push(
                        Violation::new(
                            self.name(),
                            format!(
                                "declared key tag {} does not match computed tag {computed}",
                                key.key_tag
                            ),
                        )
                        .with_bundle(&bundle.id)
                        .with_key(&key.key_identifier),
                    );
                }
            }
        }
        violations
    }
}

pub struct ApprovedAlgorithms;

impl Check for ApprovedAlgorithms {
    fn name(&self) -> &'static str {
        "ApprovedAlgorithms"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        for bundle in ctx.document.bundles() {
            for key in &bundle.keys {
                let Some(params) = key_params(key.algorithm, &key.public_key) else {
                    violations.push(
                        Violation::new(
                            self.name(),
                            format!("key {} uses unrecognized algorithm {}", key.key_identifier, key.algorithm),
                        )
                        .with_bundle(&bundle.id)
                        .with_key(&key.key_identifier),
                    );
                    continue;
                };
                if !ctx.config.approves(key.algorithm, &params) {
                    violations.push(
                        Violation::new(
                            self.name(),
                            format!(
                                "key {} algorithm {} params {:?} not approved",
                                key.key_identifier, key.algorithm, params
                            ),
                        )
                        .with_bundle(&bundle.id)
                        .with_key(&key.key_identifier),
                    );
                }
            }
        }
        violations
    }
}

pub struct KeysMatchZskPolicy {
    /// When false, two RSA parameter sets agree as long as their modulus
    /// sizes do — the exponent is left to `ApprovedAlgorithms`.
    pub rsa_exponent_must_match: bool,
}

impl KeysMatchZskPolicy {
    fn allows(&self, policy: &ksr_ceremony_domain::SignaturePolicy, algorithm: u8, params: AlgorithmParams) -> bool {
        if self.rsa_exponent_must_match {
            return policy.allows(algorithm, params);
        }
        policy.algorithm_policy.iter().any(|entry| {
            entry.algorithm == algorithm
                && match (entry.params, params) {
                    (
                        AlgorithmParams::Rsa { size: declared, .. },
                        AlgorithmParams::Rsa { size: actual, .. },
                    ) => declared == actual,
                    (declared, actual) => declared == actual,
                }
        })
    }
}

impl Check for KeysMatchZskPolicy {
    fn name(&self) -> &'static str {
        "KeysMatchZskPolicy"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let zsk_policy = ctx.zsk_policy();
        let mut violations = Vec::new();
        for bundle in ctx.document.bundles() {
            for key in &bundle.keys {
                if key.is_ksk() {
                    // KSKs are the KSK operator's own material and are
                    // checked against the KSK policy elsewhere, not here.
                    continue;
                }
                let Some(params) = key_params(key.algorithm, &key.public_key) else {
                    continue;
                };
                if !self.allows(zsk_policy, key.algorithm, params) {
                    violations.push(
                        Violation::new(
                            self.name(),
                            format!(
                                "ZSK {} algorithm {} params {:?} not declared in ZSK policy",
                                key.key_identifier, key.algorithm, params
                            ),
                        )
                        .with_bundle(&bundle.id)
                        .with_key(&key.key_identifier),
                    );
                }
            }
        }
        violations
    }
}

pub struct SignatureAlgorithmsMatchZskPolicy;

impl Check for SignatureAlgorithmsMatchZskPolicy {
    fn name(&self) -> &'static str {
        "SignatureAlgorithmsMatchZskPolicy"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let zsk_policy = ctx.zsk_policy();
        let mut violations = Vec::new();
        for bundle in ctx.document.bundles() {
            for signature in &bundle.signatures {
                let Some(key) = bundle.key_by_identifier(&signature.key_identifier) else {
                    continue; // reported by structural checks, not here
                };
                if key.is_ksk() {
                    continue;
                }
                if signature.algorithm != key.algorithm {
                    violations.push(
                        Violation::new(
                            self.name(),
                            format!(
                                "signature algorithm {} disagrees with key algorithm {}",
                                signature.algorithm, key.algorithm
                            ),
                        )
                        .with_bundle(&bundle.id)
                        .with_key(&signature.key_identifier),
                    );
                    continue;
                }
                let Some(params) = key_params(key.algorithm, &key.public_key) else {
                    continue;
                };
                if !zsk_policy.allows(signature.algorithm, params) {
                    violations.push(
                        Violation::new(
                            self.name(),
                            "signature algorithm/parameters fall outside ZSK policy",
                        )
                        .with_bundle(&bundle.id)
                        .with_key(&signature.key_identifier),
                    );
                }
            }
        }
        violations
    }
}

/// `check_keys_match_ksk_operator_policy`: every KSK published in a
/// response bundle matches an entry in the KSK operator's own declared
/// policy. Only meaningful on response documents — requests carry no KSK
/// policy, so this check is a no-op there.
pub struct KeysMatchKskPolicy;

impl Check for KeysMatchKskPolicy {
    fn name(&self) -> &'static str {
        "KeysMatchKskPolicy"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let Some(ksk_policy) = ctx.ksk_policy() else {
            return Vec::new();
        };
        let mut violations = Vec::new();
        for bundle in ctx.document.bundles() {
            for key in &bundle.keys {
                if !key.is_ksk() {
                    continue;
                }
                let Some(params) = key_params(key.algorithm, &key.public_key) else {
                    continue;
                };
                if !ksk_policy.allows(key.algorithm, params) {
                    violations.push(
                        Violation::new(
                            self.name(),
                            format!(
                                "KSK {} algorithm {} params {:?} not declared in KSK policy",
                                key.key_identifier, key.algorithm, params
                            ),
                        )
                        .with_bundle(&bundle.id)
                        .with_key(&key.key_identifier),
                    );
                }
            }
        }
        violations
    }
}

pub struct ValidateSignatures;

impl Check for ValidateSignatures {
    fn name(&self) -> &'static str {
        "ValidateSignatures"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        for bundle in ctx.document.bundles() {
            for signature in &bundle.signatures {
                let Some(key) = bundle.key_by_identifier(&signature.key_identifier) else {
                    violations.push(
                        Violation::new(
                            self.name(),
                            format!(
                                "signature references unknown key identifier {:?}",
                                signature.key_identifier
                            ),
                        )
                        .with_bundle(&bundle.id)
                        .with_key(&signature.key_identifier),
                    );
                    continue;
                };
                if key.key_tag != signature.key_tag || key.algorithm != signature.algorithm {
                    violations.push(
                        Violation::new(
                            self.name(),
                            "signature key_tag/algorithm disagrees with the referenced key",
                        )
                        .with_bundle(&bundle.id)
                        .with_key(&signature.key_identifier),
                    );
                    continue;
                }
                let signed_data = bundle_signed_data(bundle, &ctx.document.domain, signature);
                match verify_signature(key.algorithm, &key.public_key, &signed_data, &signature.signature_data)
                {
                    Ok(true) => {}
                    Ok(false) | Err(_) => {
                        violations.push(
                            Violation::new(self.name(), "signature does not verify under the referenced key")
                                .with_bundle(&bundle.id)
                                .with_key(&signature.key_identifier),
                        );
                    }
                }
            }
        }
        violations
    }
}

/// Verifies `signature` over `message` under `public_key`, using the
/// DNSSEC-specified encoding for `algorithm`. Shared with the
/// infrastructure-level soft HSM's own self-checks, but kept here since
/// the policy engine must not depend on a signer to validate a request.
pub fn verify_signature(
    algorithm: u8,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<bool, &'static str> {
    use ring::signature;

    match algorithm {
        ksr_ceremony_domain::algorithm::ALG_RSA_SHA256 => {
            let Some(AlgorithmParams::Rsa { .. }) = rsa_params(algorithm, public_key) else {
                return Err("malformed RSA public key");
            };
            let (exponent, modulus) = split_rsa_key(public_key).ok_or("malformed RSA public key")?;
            let key = signature::RsaPublicKeyComponents {
                n: modulus,
                e: exponent,
            };
            Ok(key
                .verify(&signature::RSA_PKCS1_2048_8192_SHA256, message, signature)
                .is_ok())
        }
        ksr_ceremony_domain::algorithm::ALG_ECDSA_P256_SHA256 => {
            if public_key.len() != 64 || signature.len() != 64 {
                return Err("malformed ECDSA P-256 key or signature");
            }
            let mut uncompressed = Vec::with_capacity(65);
            uncompressed.push(0x04);
            uncompressed.extend_from_slice(public_key);
            let key = signature::UnparsedPublicKey::new(&signature::ECDSA_P256_SHA256_FIXED, &uncompressed);
            Ok(key.verify(message, signature).is_ok())
        }
        _ => Err("unsupported algorithm"),
    }
}

fn split_rsa_key(public_key: &[u8]) -> Option<(&[u8], &[u8])> {
    if public_key.is_empty() {
        return None;
    }
    let (exp_len, exp_start) = if public_key[0] == 0 {
        if public_key.len() < 3 {
            return None;
        }
        (
            u16::from_be_bytes([public_key[1], public_key[2]]) as usize,
            3,
        )
    } else {
        (public_key[0] as usize, 1)
    };
    let exp_end = exp_start + exp_len;
    if exp_end > public_key.len() {
        return None;
    }
    Some((&public_key[exp_start..exp_end], &public_key[exp_end..]))
}

pub struct SignatureValidityMatchZskPolicy;

impl Check for SignatureValidityMatchZskPolicy {
    fn name(&self) -> &'static str {
        "SignatureValidityMatchZskPolicy"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let zsk_policy = ctx.zsk_policy();
        let min = zsk_policy.min_signature_validity.as_seconds();
        let max = zsk_policy.max_signature_validity.as_seconds();
        let mut violations = Vec::new();
        for bundle in ctx.document.bundles() {
            for signature in &bundle.signatures {
                let is_ksk_signature = bundle
                    .key_by_identifier(&signature.key_identifier)
                    .map(|k| k.is_ksk())
                    .unwrap_or(false);
                if is_ksk_signature {
                    continue; // KSK signatures are bounded by KSK policy, checked elsewhere
                }
                let validity = signature.validity_seconds();
                if validity < min || validity > max {
                    violations.push(
                        Violation::new(
                            self.name(),
                            format!("signature validity {validity}s outside [{min}, {max}]s"),
                        )
                        .with_bundle(&bundle.id)
                        .with_key(&signature.key_identifier),
                    );
                }
            }
        }
        violations
    }
}

pub struct CheckBundleOverlap;

impl Check for CheckBundleOverlap {
    fn name(&self) -> &'static str {
        "CheckBundleOverlap"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let zsk_policy = ctx.zsk_policy();
        let min = zsk_policy.min_validity_overlap.as_seconds();
        let max = zsk_policy.max_validity_overlap.as_seconds();
        let bundles = ctx.document.bundles();
        let mut violations = Vec::new();
        for pair in bundles.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.inception >= a.expiration {
                violations.push(
                    Violation::new(self.name(), "adjacent bundles do not overlap")
                        .with_bundle(&b.id),
                );
                continue;
            }
            let overlap = i64::from(a.expiration) - i64::from(b.inception);
            if overlap < min || overlap > max {
                violations.push(
                    Violation::new(
                        self.name(),
                        format!("bundle overlap {overlap}s outside [{min}, {max}]s"),
                    )
                    .with_bundle(&b.id),
                );
            }
        }
        violations
    }
}

pub struct CheckBundleIntervals;

impl Check for CheckBundleIntervals {
    fn name(&self) -> &'static str {
        "CheckBundleIntervals"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let min = ctx.config.min_bundle_interval.as_seconds();
        let max = ctx.config.max_bundle_interval.as_seconds();
        let bundles = ctx.document.bundles();
        let mut violations = Vec::new();
        for pair in bundles.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let gap = i64::from(b.inception) - i64::from(a.inception);
            if gap < min || gap > max {
                violations.push(
                    Violation::new(self.name(), format!("bundle inception gap {gap}s outside [{min}, {max}]s"))
                        .with_bundle(&b.id),
                );
            }
        }
        violations
    }
}

pub struct CheckCycleLength;

impl Check for CheckCycleLength {
    fn name(&self) -> &'static str {
        "CheckCycleLength"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let bundles = ctx.document.bundles();
        let (Some(first), Some(last)) = (bundles.first(), bundles.last()) else {
            return Vec::new();
        };
        let length = i64::from(last.inception) - i64::from(first.inception);
        let min = ctx.config.min_cycle_inception_length.as_seconds();
        let max = ctx.config.max_cycle_inception_length.as_seconds();
        if length < min || length > max {
            vec![Violation::new(
                self.name(),
                format!("cycle inception length {length}s outside [{min}, {max}]s"),
            )]
        } else {
            Vec::new()
        }
    }
}

pub struct SignatureExpireHorizon;

impl Check for SignatureExpireHorizon {
    fn name(&self) -> &'static str {
        "SignatureExpireHorizon"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let horizon = i64::from(ctx.now) + i64::from(ctx.config.signature_horizon_days) * 86400;
        let mut violations = Vec::new();
        for bundle in ctx.document.bundles() {
            for signature in &bundle.signatures {
                if i64::from(signature.signature_expiration) > horizon {
                    violations.push(
                        Violation::new(
                            self.name(),
                            format!(
                                "signature expires {} which is beyond the {}-day horizon",
                                signature.signature_expiration, ctx.config.signature_horizon_days
                            ),
                        )
                        .with_bundle(&bundle.id)
                        .with_key(&signature.key_identifier),
                    );
                }
            }
        }
        violations
    }
}

pub struct CheckChainKeys;

impl Check for CheckChainKeys {
    fn name(&self) -> &'static str {
        "CheckChainKeys"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let Some(previous) = ctx.previous else {
            return Vec::new(); // bootstrap ceremony, nothing to chain to
        };
        let (Some(prev_last), Some(curr_first)) = (previous.last_bundle(), ctx.document.first_bundle()) else {
            return Vec::new();
        };
        let mut violations = Vec::new();
        for prev_key in &prev_last.keys {
            if prev_key.is_ksk() {
                continue; // KSKs are reconciled separately, ZSK chain only here
            }
            let matching = curr_first
                .keys
                .iter()
                .find(|k| k.public_key == prev_key.public_key);
            if matching.is_none() {
                violations.push(
                    Violation::new(
                        self.name(),
                        format!(
                            "ZSK {} from the previous SKR's last bundle is missing from the new KSR's first bundle",
                            prev_key.key_identifier
                        ),
                    )
                    .with_bundle(&curr_first.id)
                    .with_key(&prev_key.key_identifier),
                );
            }
        }
        violations
    }
}

pub struct CheckChainOverlap;

impl Check for CheckChainOverlap {
    fn name(&self) -> &'static str {
        "CheckChainOverlap"
    }

    fn run(&self, ctx: &PolicyContext) -> Vec<Violation> {
        let Some(previous) = ctx.previous else {
            return Vec::new();
        };
        let (Some(prev_last), Some(curr_first)) = (previous.last_bundle(), ctx.document.first_bundle()) else {
            return Vec::new();
        };
        let zsk_policy = ctx.zsk_policy();
        let min = zsk_policy.min_validity_overlap.as_seconds();
        let max = zsk_policy.max_validity_overlap.as_seconds();

        if curr_first.inception >= prev_last.expiration {
            return vec![Violation::new(
                self.name(),
                "new KSR's first bundle does not overlap the previous SKR's last bundle",
            )
            .with_bundle(&curr_first.id)];
        }
        let overlap = i64::from(prev_last.expiration) - i64::from(curr_first.inception);
        if overlap < min || overlap > max {
            vec![Violation::new(
                self.name(),
                format!("chain overlap {overlap}s outside [{min}, {max}]s"),
            )
            .with_bundle(&curr_first.id)]
        } else {
            Vec::new()
        }
    }
}
