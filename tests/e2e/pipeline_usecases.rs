//! End-to-end pipeline tests: gateway + assembler against real adapters.

use addon_forge_adapters::{FixedGenerator, SessionCache, ZipCodec};
use addon_forge_app::{
    AssembleBundleDeps, AssembleBundleInput, GenerateBundleDeps, GenerateBundleInput,
    assemble_bundle, generate_bundle,
};
use addon_forge_config::CacheConfig;
use addon_forge_domain::{AddonName, InputOrigin, UploadedInput};
use addon_forge_ports::{ArchiveCodecPort, ArchiveEntry};
use addon_forge_shared::{ErrorEnvelope, RequestContext, Result};
use std::sync::Arc;

const FIRST_PASS: &str = r#"{
    "files": [
        {"path": "behavior/manifest.json", "content": "{\"format_version\": 2}"},
        {"path": "resource/manifest.json", "content": "{\"format_version\": 2}"}
    ],
    "relocations": [
        {"original_path": "dragon.png", "new_path": "resource/textures/entity/dragon.png"}
    ],
    "report": "Generated a dragon addon."
}"#;

const SECOND_PASS: &str = r#"{
    "files": [
        {"path": "behavior/manifest.json", "content": "{\"format_version\": 2}"},
        {"path": "resource/manifest.json", "content": "{\"format_version\": 2}"}
    ]
}"#;

fn generate_deps(generator: Arc<FixedGenerator>, cache: Arc<SessionCache>) -> GenerateBundleDeps {
    GenerateBundleDeps {
        generator,
        cache,
        logger: None,
        telemetry: None,
    }
}

fn assemble_deps() -> AssembleBundleDeps {
    AssembleBundleDeps {
        codec: Arc::new(ZipCodec::new()),
        logger: None,
        telemetry: None,
    }
}

fn session_cache() -> Result<Arc<SessionCache>> {
    Ok(Arc::new(SessionCache::new(&CacheConfig {
        enabled: true,
        max_entries: 16,
        max_bytes: 1_048_576,
    })?))
}

fn pipeline_input(inputs: Vec<UploadedInput>) -> GenerateBundleInput {
    GenerateBundleInput {
        system_instruction: "build bedrock addons".into(),
        prompt: "make a dragon addon".into(),
        inputs,
        temperature: Some(0.9),
    }
}

fn entry_bytes<'a>(entries: &'a [ArchiveEntry], path: &str) -> Option<&'a [u8]> {
    entries
        .iter()
        .find(|entry| entry.path.as_ref() == path)
        .map(|entry| entry.bytes.as_slice())
}

#[tokio::test]
async fn prompt_to_archive_pipeline_produces_consistent_entries() -> Result<()> {
    let generator = Arc::new(FixedGenerator::new(vec![
        FIRST_PASS.into(),
        SECOND_PASS.into(),
    ]));
    let cache = session_cache()?;
    let ctx = RequestContext::new_request();

    let texture = UploadedInput::new(
        "assets/dragon.png",
        vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a],
        InputOrigin::Asset,
    );
    let draft = generate_bundle(
        &ctx,
        &generate_deps(generator.clone(), cache),
        pipeline_input(vec![texture.clone()]),
    )
    .await?;
    assert_eq!(generator.call_count(), 2);
    assert_eq!(draft.report.as_deref(), Some("Generated a dragon addon."));

    let bundle = assemble_bundle(
        &ctx,
        &assemble_deps(),
        AssembleBundleInput {
            name: AddonName::parse("Dragon Addon").map_err(ErrorEnvelope::from)?,
            files: draft.files,
            inputs: vec![texture],
            relocations: draft.relocations,
        },
    )
    .await?;
    assert!(bundle.warnings.is_empty());
    assert_eq!(bundle.file_name.as_ref(), "Dragon Addon.mcaddon");

    let entries = ZipCodec::new().unpack(&bundle.bytes)?;
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entry_bytes(&entries, "behavior/manifest.json"),
        Some(br#"{"format_version": 2}"#.as_slice())
    );
    assert_eq!(
        entry_bytes(&entries, "resource/textures/entity/dragon.png"),
        Some([0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a].as_slice())
    );
    Ok(())
}

#[tokio::test]
async fn repeated_requests_are_served_from_the_cache() -> Result<()> {
    // Only two scripted responses exist; a third call would fail, so the
    // second invocation must come from the cache.
    let generator = Arc::new(FixedGenerator::new(vec![
        FIRST_PASS.into(),
        SECOND_PASS.into(),
    ]));
    let cache = session_cache()?;
    let deps = generate_deps(generator.clone(), cache);
    let ctx = RequestContext::new_request();

    let first = generate_bundle(&ctx, &deps, pipeline_input(Vec::new())).await?;
    let second = generate_bundle(&ctx, &deps, pipeline_input(Vec::new())).await?;

    assert_eq!(generator.call_count(), 2);
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn differing_prompts_do_not_share_cache_entries() -> Result<()> {
    let generator = Arc::new(FixedGenerator::new(vec![
        FIRST_PASS.into(),
        SECOND_PASS.into(),
        FIRST_PASS.into(),
        SECOND_PASS.into(),
    ]));
    let cache = session_cache()?;
    let deps = generate_deps(generator.clone(), cache);
    let ctx = RequestContext::new_request();

    let mut input = pipeline_input(Vec::new());
    let _ = generate_bundle(&ctx, &deps, input.clone()).await?;
    input.prompt = "make a dragon addon with fire breath".into();
    let _ = generate_bundle(&ctx, &deps, input).await?;

    assert_eq!(generator.call_count(), 4);
    Ok(())
}

#[tokio::test]
async fn relocation_resolves_from_an_uploaded_container() -> Result<()> {
    let codec = ZipCodec::new();
    let container_bytes = codec.pack(&[ArchiveEntry::new(
        "textures/entity/dragon.png",
        vec![0xaa, 0xbb, 0xcc],
    )])?;
    let container = UploadedInput::new("old_pack.mcpack", container_bytes, InputOrigin::AddonFile);

    let generator = Arc::new(FixedGenerator::new(vec![
        FIRST_PASS.into(),
        SECOND_PASS.into(),
    ]));
    let cache = session_cache()?;
    let ctx = RequestContext::new_request();

    let draft = generate_bundle(
        &ctx,
        &generate_deps(generator, cache),
        pipeline_input(vec![container.clone()]),
    )
    .await?;

    let bundle = assemble_bundle(
        &ctx,
        &assemble_deps(),
        AssembleBundleInput {
            name: AddonName::parse("Container Pack").map_err(ErrorEnvelope::from)?,
            files: draft.files,
            inputs: vec![container],
            relocations: draft.relocations,
        },
    )
    .await?;
    assert!(bundle.warnings.is_empty());

    let entries = ZipCodec::new().unpack(&bundle.bytes)?;
    assert_eq!(
        entry_bytes(&entries, "resource/textures/entity/dragon.png"),
        Some([0xaa, 0xbb, 0xcc].as_slice())
    );
    Ok(())
}
