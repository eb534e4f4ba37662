//! Property-based tests for the merge engine.
//!
//! These focus on the naming and idempotency invariants of a merge.

use super::{merge, translated_name};
use crate::document::{AuthIdentity, Cluster, Context, Document};
use crate::SourceDefinition;
use proptest::prelude::*;

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,12}"
}

fn label_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9.-]{0,15}"
}

fn source_doc(context: &str, cluster: &str, user: &str, port: u16) -> Document {
    let mut doc = Document::default();
    doc.current_context = context.to_string();
    doc.contexts.insert(
        context.to_string(),
        Context {
            cluster: cluster.to_string(),
            auth_identity: user.to_string(),
            ..Context::default()
        },
    );
    doc.clusters.insert(
        cluster.to_string(),
        Cluster::new(format!("https://10.0.0.5:{port}")),
    );
    doc.identities
        .insert(user.to_string(), AuthIdentity::default());
    doc
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    // Every merged context points at its own translated cluster and user
    #[test]
    fn merged_context_references_translated_names(
        context in name_strategy(),
        cluster in name_strategy(),
        user in name_strategy(),
        label in label_strategy(),
    ) {
        let src = source_doc(&context, &cluster, &user, 6443);
        let mut dest = Document::default();
        merge(&mut dest, &src, &SourceDefinition::new("h"), &label).unwrap();

        let merged = &dest.contexts[&translated_name(&context, &label)];
        prop_assert_eq!(&merged.cluster, &translated_name(&cluster, &label));
        prop_assert_eq!(&merged.auth_identity, &translated_name(&user, &label));
        prop_assert!(dest.clusters.contains_key(&merged.cluster));
        prop_assert!(dest.identities.contains_key(&merged.auth_identity));
        prop_assert_eq!(&dest.current_context, &translated_name(&context, &label));
    }

    // Merging the same label twice yields the same key set as merging once
    #[test]
    fn repeated_merge_is_idempotent_on_keys(
        context in name_strategy(),
        cluster in name_strategy(),
        user in name_strategy(),
        label in label_strategy(),
    ) {
        let src = source_doc(&context, &cluster, &user, 6443);
        let def = SourceDefinition::new("h");

        let mut once = Document::default();
        merge(&mut once, &src, &def, &label).unwrap();
        let mut twice = once.clone();
        merge(&mut twice, &src, &def, &label).unwrap();

        prop_assert_eq!(once, twice);
    }

    // Autodetect without an override port keeps the original port
    #[test]
    fn autodetect_preserves_port(
        port in 1u16..=65535,
        a in 1u8..=254,
        b in 1u8..=254,
    ) {
        let src = source_doc("ctx", "c", "u", port);
        let host = format!("192.0.{a}.{b}");
        let def = SourceDefinition::new("h")
            .with_autodetect(true)
            .with_resolved_host(host.clone());
        let mut dest = Document::default();
        merge(&mut dest, &src, &def, "l").unwrap();

        prop_assert_eq!(&dest.clusters["c@l"].server, &format!("https://{host}:{port}"));
    }

    // Insecure always wins over address rewrites
    #[test]
    fn insecure_always_clears_trust(autodetect in any::<bool>(), explicit in any::<bool>()) {
        let mut src = source_doc("ctx", "c", "u", 6443);
        src.clusters.get_mut("c").unwrap().certificate_authority = Some("/ca".to_string());
        let mut def = SourceDefinition::new("h")
            .with_insecure(true)
            .with_autodetect(autodetect)
            .with_resolved_host("127.0.0.1");
        if explicit && !autodetect {
            def = def.with_explicit_address("10.1.1.1:443");
        }
        let mut dest = Document::default();
        merge(&mut dest, &src, &def, "l").unwrap();

        let cluster = &dest.clusters["c@l"];
        prop_assert!(cluster.insecure_skip_tls_verify);
        prop_assert!(cluster.certificate_authority.is_none());
        prop_assert!(cluster.certificate_authority_data.is_none());
    }
}
