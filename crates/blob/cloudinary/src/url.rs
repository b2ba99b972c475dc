use dropfade_blob::{BlobError, BlobRef, ResourceKind};
use dropfade_core::{is_document, is_document_extension};
use percent_encoding::percent_decode_str;
use reqwest::Url;

/// Transformation applied as the very last delivery attempt for images.
const LAST_RESORT_TRANSFORMATION: &str = "f_auto,q_auto";

/// Parse a delivery URL of the form
/// `<base>/<cloud>/<resource_type>/upload/[<transformations>/][v<version>/]<public_id>[.<ext>]`.
///
/// Raw resources keep their extension as part of the public id; image and
/// video public ids never carry one.
pub fn ref_from_delivery_url(url: &str) -> Result<BlobRef, BlobError> {
    let invalid = || BlobError::InvalidReference(url.to_owned());

    let parsed = Url::parse(url).map_err(|_| invalid())?;
    let segments: Vec<String> = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect();

    let upload_at = segments
        .iter()
        .enumerate()
        .position(|(i, s)| {
            s == "upload" && i > 0 && ResourceKind::parse(&segments[i - 1]).is_some()
        })
        .ok_or_else(invalid)?;
    let kind = ResourceKind::parse(&segments[upload_at - 1]).ok_or_else(invalid)?;

    let rest = &segments[upload_at + 1..];
    let id_parts = match rest.iter().position(|s| is_version(s)) {
        Some(v) => &rest[v + 1..],
        None => rest,
    };
    let (last, dirs) = id_parts.split_last().ok_or_else(invalid)?;

    let last = if kind == ResourceKind::Raw {
        last.as_str()
    } else {
        last.rsplit_once('.').map_or(last.as_str(), |(stem, _)| stem)
    };
    if last.is_empty() {
        return Err(invalid());
    }

    let mut id = dirs.join("/");
    if !id.is_empty() {
        id.push('/');
    }
    id.push_str(last);

    Ok(BlobRef::new(id).with_kind(kind))
}

fn is_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Untransformed delivery URL for a public id.
pub fn delivery_url(
    base: &str,
    cloud: &str,
    kind: ResourceKind,
    public_id: &str,
    format: Option<&str>,
) -> String {
    let base = base.trim_end_matches('/');
    match (kind, format) {
        (ResourceKind::Raw, _) | (_, None) => format!("{base}/{cloud}/{kind}/upload/{public_id}"),
        (_, Some(ext)) => format!("{base}/{cloud}/{kind}/upload/{public_id}.{ext}"),
    }
}

/// Delivery URLs to try, in order, once a resource has been located as `kind`.
///
/// The resource's own URLs come first, then a freshly synthesized untransformed
/// URL. Only as a last resort is a format/quality transformation applied, and
/// only for image-class content; documents fall back to the raw path instead.
pub fn candidate_urls(
    base: &str,
    cloud: &str,
    kind: ResourceKind,
    public_id: &str,
    secure_url: Option<&str>,
    plain_url: Option<&str>,
    format: Option<&str>,
) -> Vec<String> {
    let document = kind == ResourceKind::Raw
        || format.is_some_and(is_document_extension)
        || is_document(public_id);

    let mut urls: Vec<String> = Vec::with_capacity(4);
    let mut push = |u: String| {
        if !u.is_empty() && !urls.contains(&u) {
            urls.push(u);
        }
    };

    if let Some(u) = secure_url {
        push(u.to_owned());
    }
    if let Some(u) = plain_url {
        push(u.to_owned());
    }
    push(delivery_url(base, cloud, kind, public_id, format));

    if document {
        push(delivery_url(base, cloud, ResourceKind::Raw, public_id, None));
    } else if kind == ResourceKind::Image {
        let base = base.trim_end_matches('/');
        push(format!(
            "{base}/{cloud}/image/upload/{LAST_RESORT_TRANSFORMATION}/{public_id}"
        ));
    }

    urls
}
