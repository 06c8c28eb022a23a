use tracing::error;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::policy::bundle_policy::RTCBundlePolicy;
use webrtc::rtp_transceiver::rtp_codec::{
    RTCRtpCodecCapability, RTCRtpCodecParameters, RTCRtpHeaderExtensionCapability, RTPCodecType,
};
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;

pub struct MediaSetup;

impl MediaSetup {
    pub fn create_webrtc_api() -> webrtc::api::API {
        let mut media_engine = MediaEngine::default();

        media_engine
            .register_codec(
                RTCRtpCodecParameters {
                    capability: RTCRtpCodecCapability {
                        mime_type: "audio/opus".to_owned(),
                        clock_rate: 48000,
                        channels: 2,
                        sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                        ..Default::default()
                    },
                    payload_type: 111,
                    ..Default::default()
                },
                RTPCodecType::Audio,
            )
            .unwrap_or_else(|e| panic!("failed to register Opus codec: {}", e));

        media_engine
            .register_codec(
                RTCRtpCodecParameters {
                    capability: RTCRtpCodecCapability {
                        mime_type: "video/VP8".to_owned(),
                        clock_rate: 90000,
                        channels: 0,
                        sdp_fmtp_line: "".to_owned(),
                        ..Default::default()
                    },
                    payload_type: 96,
                    ..Default::default()
                },
                RTPCodecType::Video,
            )
            .unwrap_or_else(|e| panic!("failed to register VP8 codec: {}", e));

        media_engine
            .register_codec(
                RTCRtpCodecParameters {
                    capability: RTCRtpCodecCapability {
                        mime_type: "video/H264".to_owned(),
                        clock_rate: 90000,
                        channels: 0,
                        sdp_fmtp_line:
                            "level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42e01f"
                                .to_owned(),
                        ..Default::default()
                    },
                    payload_type: 102,
                    ..Default::default()
                },
                RTPCodecType::Video,
            )
            .unwrap_or_else(|e| error!("failed to register H264 codec: {}", e));

        let extensions = [
            "urn:ietf:params:rtp-hdrext:sdes:mid",
            "urn:ietf:params:rtp-hdrext:sdes:rtp-stream-id",
            "urn:ietf:params:rtp-hdrext:sdes:repaired-rtp-stream-id",
            "http://www.webrtc.org/experiments/rtp-hdrext/abs-send-time",
            "http://www.ietf.org/id/draft-holmer-rmcat-transport-wide-cc-extensions-01",
            "urn:ietf:params:rtp-hdrext:ssrc-audio-level",
            "urn:ietf:params:rtp-hdrext:toffset",
            "urn:3gpp:video-orientation",
            "http://www.webrtc.org/experiments/rtp-hdrext/video-content-type",
        ];

        for extension in extensions {
            let _ = media_engine.register_header_extension(
                RTCRtpHeaderExtensionCapability {
                    uri: extension.to_string(),
                },
                RTPCodecType::Video,
                None,
            );
            let _ = media_engine.register_header_extension(
                RTCRtpHeaderExtensionCapability {
                    uri: extension.to_string(),
                },
                RTPCodecType::Audio,
                None,
            );
        }

        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine).unwrap();

        APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build()
    }

    /// Two hardcoded STUN servers per the external-interfaces section; no
    /// env-var override and no TURN.
    pub fn get_rtc_config() -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: vec![
                    "stun:stun.l.google.com:19302".to_string(),
                    "stun:stun1.l.google.com:19302".to_string(),
                ],
                ..Default::default()
            }],
            bundle_policy: RTCBundlePolicy::MaxBundle,
            ..Default::default()
        }
    }

    /// Adds two recv-only transceivers (video, audio) immediately after PC
    /// construction so the very first offer already advertises both media
    /// kinds, publisher or viewer, regardless of whether any track exists
    /// yet.
    pub async fn add_recvonly_transceivers(
        pc: &webrtc::peer_connection::RTCPeerConnection,
    ) -> webrtc::error::Result<()> {
        pc.add_transceiver_from_kind(
            RTPCodecType::Video,
            Some(RTCRtpTransceiverInit {
                direction: RTCRtpTransceiverDirection::Recvonly,
                send_encodings: vec![],
            }),
        )
        .await?;

        pc.add_transceiver_from_kind(
            RTPCodecType::Audio,
            Some(RTCRtpTransceiverInit {
                direction: RTCRtpTransceiverDirection::Recvonly,
                send_encodings: vec![],
            }),
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webrtc::peer_connection::configuration::RTCConfiguration as Cfg;

    #[tokio::test]
    async fn test_webrtc_api_configuration() {
        let api = MediaSetup::create_webrtc_api();
        let pc = api.new_peer_connection(Cfg::default()).await;
        assert!(pc.is_ok());
    }

    #[test]
    fn test_rtc_config_has_two_stun_servers() {
        let config = MediaSetup::get_rtc_config();
        assert_eq!(config.ice_servers.len(), 1);
        assert_eq!(config.ice_servers[0].urls.len(), 2);
        assert!(config.ice_servers[0]
            .urls
            .contains(&"stun:stun.l.google.com:19302".to_string()));
        assert!(config.ice_servers[0]
            .urls
            .contains(&"stun:stun1.l.google.com:19302".to_string()));
    }

    #[tokio::test]
    async fn test_add_recvonly_transceivers() {
        let api = MediaSetup::create_webrtc_api();
        let pc = api.new_peer_connection(Cfg::default()).await.unwrap();
        MediaSetup::add_recvonly_transceivers(&pc).await.unwrap();
        assert_eq!(pc.get_transceivers().await.len(), 2);
    }
}
