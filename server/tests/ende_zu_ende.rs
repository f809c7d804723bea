//! Ende-zu-Ende-Test ueber den kompletten Voice-Pfad
//!
//! Zwei Clients verbinden sich ueber echten localhost-UDP mit dem
//! Router: der Sender funkt auf 251.000 MHz AM, der Empfaenger
//! dekodiert das weitergeleitete Paket, rekonstruiert die Uebertragung
//! und rendert sie durch die Effekt-Pipeline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use funklink_core::event::FunklinkEvent;
use funklink_core::settings::InMemorySettings;
use funklink_core::types::{ClientGuid, Coalition, Modulation, UnitId};
use funklink_effects::codec::Pcm16Codec;
use funklink_effects::{
    AudioCodec, BufferPool, DeJitteredTransmission, EffectsPipeline, JitterReconstructor,
    RadioModelFactory,
};
use funklink_protocol::voice::{RadioFrequenz, VoicePacket};
use funklink_radio::{bestes_empfangsgeraet, Radio, RadioSet, Uebertragung};
use funklink_server::events::BroadcastEventBus;
use funklink_voice::{
    ClientRecord, ClientRegistry, TransmissionLog, TransportZeiten, VoiceRouter, VoiceTransport,
    VoiceTransportHandle,
};

const FREQUENZ: f64 = 251_000_000.0;
const FRAME_SAMPLES: usize = 480;

fn schnelle_zeiten() -> TransportZeiten {
    TransportZeiten {
        ping_intervall: Duration::from_millis(50),
        zeitlimit: Duration::from_millis(2000),
        neuaufbau_pause: Duration::from_millis(20),
    }
}

async fn auf_bereitschaft_warten(handle: &VoiceTransportHandle) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !handle.ist_bereit() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Transport muss bereit werden");
}

/// Leiser 440-Hz-Testton, ein Frame lang
fn testton() -> Vec<f32> {
    (0..FRAME_SAMPLES)
        .map(|i| 0.25 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48_000.0).sin())
        .collect()
}

#[tokio::test]
async fn uebertragung_von_sender_bis_lautsprecher() {
    // --- Server-Seite aufbauen -------------------------------------------
    let registry = ClientRegistry::neu();
    let events = Arc::new(BroadcastEventBus::neu());
    let mut ereignisse = events.abonnieren();
    let (protokoll, _protokoll_task) = TransmissionLog::starten();

    let router = Arc::new(
        VoiceRouter::binden(
            "127.0.0.1:0".parse().unwrap(),
            registry.clone(),
            Arc::new(InMemorySettings::neu()),
            events.clone(),
            protokoll,
        )
        .await
        .unwrap(),
    );
    let server_adresse = router.lokale_adresse().unwrap();

    let abbruch = CancellationToken::new();
    let router_abbruch = abbruch.clone();
    let router_task = {
        let router = Arc::clone(&router);
        tokio::spawn(async move { router.empfangs_loop(router_abbruch).await })
    };

    // --- Zwei Clients registrieren und verbinden -------------------------
    let sender_guid = ClientGuid::neu();
    let hoerer_guid = ClientGuid::neu();

    registry.einfuegen(ClientRecord::neu(
        sender_guid.clone(),
        "Viper 1-1",
        Coalition::Blue,
    ));
    let mut hoerer_record = ClientRecord::neu(hoerer_guid.clone(), "Viper 1-2", Coalition::Blue);
    let hoerer_radios = RadioSet::neu(UnitId(2), vec![Radio::neu(FREQUENZ, Modulation::Am)]);
    hoerer_record.radios = hoerer_radios.clone();
    registry.einfuegen(hoerer_record);

    let (sender_transport, sender_handle, _sender_eingehend) = VoiceTransport::mit_zeiten(
        sender_guid.clone(),
        server_adresse,
        events.clone(),
        schnelle_zeiten(),
    );
    let (hoerer_transport, hoerer_handle, mut hoerer_eingehend) = VoiceTransport::mit_zeiten(
        hoerer_guid.clone(),
        server_adresse,
        events.clone(),
        schnelle_zeiten(),
    );
    tokio::spawn(sender_transport.lauf(abbruch.clone()));
    tokio::spawn(hoerer_transport.lauf(abbruch.clone()));

    auf_bereitschaft_warten(&sender_handle).await;
    auf_bereitschaft_warten(&hoerer_handle).await;

    // --- Senden: ein Frame Testton auf 251.000 AM ------------------------
    let mut codec = Pcm16Codec::neu(FRAME_SAMPLES);
    let pcm = testton();
    let mut nutzdaten = vec![0u8; FRAME_SAMPLES * 2];
    let kodiert = codec.encode(&pcm, &mut nutzdaten).unwrap();
    nutzdaten.truncate(kodiert);

    let paket = VoicePacket::neu(
        sender_guid.clone(),
        UnitId(1),
        1,
        vec![RadioFrequenz::neu(FREQUENZ, Modulation::Am)],
        nutzdaten,
    );
    assert!(sender_handle.senden(paket.encode()));

    // --- Empfang: Paket kommt mit Hop 1 beim Hoerer an -------------------
    let draht_bytes = tokio::time::timeout(Duration::from_secs(2), hoerer_eingehend.recv())
        .await
        .expect("Weitergeleitetes Paket erwartet")
        .unwrap();
    let empfangen = VoicePacket::decode(&draht_bytes).unwrap();
    assert_eq!(empfangen.hops, 1);
    assert_eq!(empfangen.original_sender, sender_guid);

    // --- Erreichbarkeit aus Empfaenger-Sicht nachvollziehen --------------
    let eintrag = empfangen.hauptfrequenz().unwrap();
    let empfang = bestes_empfangsgeraet(
        &hoerer_radios,
        &Uebertragung {
            frequenz: eintrag.frequenz,
            modulation: eintrag.modulation,
            schluessel: eintrag.verschluesselung,
            sender_unit: empfangen.unit_id,
        },
        &[],
        false,
    )
    .expect("Hoerer muss die Uebertragung empfangen");

    // --- Dekodieren, rekonstruieren, rendern -----------------------------
    let pool = BufferPool::neu();
    let mut dekodiert = vec![0f32; FRAME_SAMPLES];
    let samples = codec.decode(&empfangen.nutzdaten, &mut dekodiert).unwrap();
    assert_eq!(samples, FRAME_SAMPLES);

    let mut jitter = JitterReconstructor::neu(pool.clone());
    jitter.fragment_hinzufuegen(
        DeJitteredTransmission {
            radio_index: empfang.radio_index,
            pcm: dekodiert,
            modulation: eintrag.modulation,
            verschluesselt: eintrag.ist_verschluesselt(),
            entschluesselbar: empfang.entschluesselbar,
            empfangsstaerke: empfang.empfangsstaerke,
            los_verlust: empfang.los_verlust,
            sekundaer: empfang.sekundaer,
            effekte_umgehen: false,
        },
        Instant::now(),
    );
    let segmente = jitter.tick();
    assert_eq!(segmente.len(), 1);

    let mut pipeline = EffectsPipeline::neu(
        Arc::new(InMemorySettings::neu()),
        Arc::new(RadioModelFactory::leer()),
        pool,
    );
    let mut frame = vec![0f32; FRAME_SAMPLES];
    let geschrieben = pipeline.render(&mut frame, &segmente, Some("ARC-210"));
    assert_eq!(geschrieben, FRAME_SAMPLES);

    // Hoerbar: deutlich ueber dem reinen Rauschteppich
    let energie: f32 = frame.iter().map(|s| s * s).sum();
    assert!(energie > 1e-3, "Frame ist praktisch stumm: {energie}");
    assert!(frame.iter().all(|s| s.is_finite()));

    // --- Sende-Anzeige und Ereignis --------------------------------------
    let gesendet_ereignis = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Ok(FunklinkEvent::SendetAuf { client, anzeige }) = ereignisse.recv().await {
                if client == sender_guid {
                    break anzeige;
                }
            }
        }
    })
    .await
    .expect("SendetAuf-Ereignis erwartet");
    assert_eq!(gesendet_ereignis, "251.000 AM");

    let anzeige = registry
        .lesen(&sender_guid, |eintrag| eintrag.sendet_auf.clone())
        .flatten();
    assert_eq!(anzeige.as_deref(), Some("251.000 AM"));

    abbruch.cancel();
    router_task.await.unwrap();
}
