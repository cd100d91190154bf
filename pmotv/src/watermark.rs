//! Channel logo overlay for lineup items

use crate::models::{Channel, LineupItem, Watermark};
use serde::{Deserialize, Serialize};

/// Transcoder options that gate the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeSettings {
    #[serde(default)]
    pub enable_transcoding: bool,
    #[serde(default)]
    pub disable_channel_overlay: bool,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Watermark to burn into `item`, if any
///
/// Filler items carry no overlay unless the channel explicitly sets
/// `disable_filler_overlay` to false. Without its own image the watermark
/// uses the channel icon.
pub fn resolve_watermark(
    settings: &TranscodeSettings,
    channel: &Channel,
    item: &LineupItem,
) -> Option<Watermark> {
    if !settings.enable_transcoding || settings.disable_channel_overlay {
        return None;
    }

    let disable_filler_overlay = channel.disable_filler_overlay.unwrap_or(true);
    if matches!(item, LineupItem::Commercial(_)) && disable_filler_overlay {
        return None;
    }

    let watermark = channel.watermark.as_ref().filter(|w| w.enabled)?;
    let url = non_empty(watermark.url.as_deref()).or_else(|| non_empty(channel.icon.as_deref()))?;

    Some(Watermark {
        enabled: true,
        url: Some(url.to_string()),
        fixed_size: Some(watermark.fixed_size == Some(true)),
        animated: Some(watermark.animated == Some(true)),
        ..watermark.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OfflineItem, RedirectItem, StreamItem};

    const ON: TranscodeSettings = TranscodeSettings {
        enable_transcoding: true,
        disable_channel_overlay: false,
    };

    fn channel(watermark: Option<Watermark>) -> Channel {
        let mut channel = Channel::new(1, "One", 0, vec![]);
        channel.icon = Some("http://host/icon.png".into());
        channel.watermark = watermark;
        channel
    }

    fn offline() -> LineupItem {
        LineupItem::Offline(OfflineItem::new("Channel Offline", 1_000, None))
    }

    fn commercial() -> LineupItem {
        LineupItem::Commercial(StreamItem {
            title: "Ad".into(),
            key: None,
            server_key: None,
            file: None,
            start: 0,
            stream_duration: 1_000,
            duration: 1_000,
            beginning_offset: 0,
            filler_id: None,
        })
    }

    fn enabled() -> Watermark {
        Watermark {
            enabled: true,
            width: 10.0,
            position: Some("bottom-right".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_falls_back_to_channel_icon() {
        let watermark = resolve_watermark(&ON, &channel(Some(enabled())), &offline()).unwrap();
        assert_eq!(watermark.url.as_deref(), Some("http://host/icon.png"));
        assert_eq!(watermark.width, 10.0);
        assert_eq!(watermark.fixed_size, Some(false));
        assert_eq!(watermark.animated, Some(false));
    }

    #[test]
    fn test_gated_by_transcoder_and_channel() {
        let ch = channel(Some(enabled()));
        assert!(resolve_watermark(&TranscodeSettings::default(), &ch, &offline()).is_none());

        let no_overlay = TranscodeSettings {
            disable_channel_overlay: true,
            ..ON
        };
        assert!(resolve_watermark(&no_overlay, &ch, &offline()).is_none());

        let mut disabled = enabled();
        disabled.enabled = false;
        assert!(resolve_watermark(&ON, &channel(Some(disabled)), &offline()).is_none());
        assert!(resolve_watermark(&ON, &channel(None), &offline()).is_none());

        let mut bare = channel(Some(enabled()));
        bare.icon = Some(String::new());
        assert!(resolve_watermark(&ON, &bare, &offline()).is_none());
    }

    #[test]
    fn test_filler_overlay() {
        let mut ch = channel(Some(enabled()));
        assert!(resolve_watermark(&ON, &ch, &commercial()).is_none());

        ch.disable_filler_overlay = Some(false);
        assert!(resolve_watermark(&ON, &ch, &commercial()).is_some());

        let redirect = LineupItem::Redirect(RedirectItem {
            channel: 2,
            duration: 1_000,
        });
        ch.disable_filler_overlay = None;
        assert!(resolve_watermark(&ON, &ch, &redirect).is_some());
    }
}
