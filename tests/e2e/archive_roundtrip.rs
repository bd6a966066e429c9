//! Archive round-trip tests against the real zip codec.

use addon_forge_adapters::ZipCodec;
use addon_forge_app::{
    AssembleBundleDeps, AssembleRawInput, RawContainer, assemble_raw_containers,
};
use addon_forge_domain::AddonName;
use addon_forge_ports::{ArchiveCodecPort, ArchiveEntry};
use addon_forge_shared::{ErrorEnvelope, RequestContext, Result};
use std::sync::Arc;

fn deps() -> AssembleBundleDeps {
    AssembleBundleDeps {
        codec: Arc::new(ZipCodec::new()),
        logger: None,
        telemetry: None,
    }
}

#[tokio::test]
async fn merged_containers_survive_the_round_trip_byte_identical() -> Result<()> {
    let codec = ZipCodec::new();
    let behavior = codec.pack(&[ArchiveEntry::new("manifest.json", Vec::from(*b"{\"bp\":1}"))])?;
    let resource = codec.pack(&[ArchiveEntry::new("manifest.json", Vec::from(*b"{\"rp\":1}"))])?;

    let ctx = RequestContext::new_request();
    let bundle = assemble_raw_containers(
        &ctx,
        &deps(),
        AssembleRawInput {
            name: AddonName::parse("Merged Pack").map_err(ErrorEnvelope::from)?,
            first: Some(RawContainer {
                file_name: "behavior.mcpack".into(),
                bytes: behavior.clone().into(),
            }),
            second: Some(RawContainer {
                file_name: "resource.mcpack".into(),
                bytes: resource.clone().into(),
            }),
        },
    )
    .await?;

    let entries = codec.unpack(&bundle.bytes)?;
    assert_eq!(entries.len(), 2);

    let unpacked_behavior = entries
        .iter()
        .find(|entry| entry.path.as_ref() == "behavior.mcpack")
        .map(|entry| entry.bytes.clone());
    assert_eq!(unpacked_behavior.as_deref(), Some(behavior.as_slice()));

    // The inner containers are inserted unmodified and stay decodable.
    let inner = codec.unpack(&resource)?;
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].bytes, b"{\"rp\":1}");
    Ok(())
}

#[tokio::test]
async fn archive_file_name_is_sanitized() -> Result<()> {
    let codec = ZipCodec::new();
    let container = codec.pack(&[ArchiveEntry::new("manifest.json", Vec::from(*b"{}"))])?;

    let ctx = RequestContext::new_request();
    let bundle = assemble_raw_containers(
        &ctx,
        &deps(),
        AssembleRawInput {
            name: AddonName::parse("Mega⚡Pack!!").map_err(ErrorEnvelope::from)?,
            first: Some(RawContainer {
                file_name: "pack.mcpack".into(),
                bytes: container.into(),
            }),
            second: None,
        },
    )
    .await?;

    assert_eq!(bundle.file_name.as_ref(), "MegaPack.mcaddon");
    Ok(())
}
