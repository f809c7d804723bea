//! Voice-Protokoll (UDP)
//!
//! Definiert die binaere Paketstruktur fuer die Audio-Uebertragung via UDP.
//! Das Opus-Encoding erfolgt ausserhalb; Router und Transport behandeln die
//! Nutzdaten als opake Bytes.
//!
//! ## Paketformat (Version 1, big-endian, kein serde)
//!
//! ```text
//! Offset     Len   Beschreibung
//! ------     ---   -----------
//!  0          1    Version
//!  1          1    Anzahl Funkgeraete-Eintraege n (1..=16)
//!  2          1    Hop-Zaehler (Anzahl Relais-Weiterleitungen)
//!  3          1    Reserviert (0)
//!  4          4    UnitId (big-endian)
//!  8          8    Paketnummer (big-endian)
//! 16         22    Sender-GUID (ASCII)
//! 38         22    Original-Sender-GUID (ASCII, bei Relais != Sender)
//! 60       n*10    Pro Funkgeraet: Frequenz f64 Hz (BE),
//!                  Modulation (u8), Verschluesselungs-Schluessel-ID (u8)
//! 60+n*10     N    Opus-Nutzdaten
//! ```
//!
//! Ein Datagramm das exakt 22 Bytes lang ist, ist ein Keepalive (nur die
//! GUID) und darf nie als Voice-Paket interpretiert werden – das kleinste
//! gueltige Voice-Paket ist 70 Bytes (n=1, leere Nutzdaten).

use funklink_core::types::{ClientGuid, Modulation, UnitId, GUID_LAENGE};
use std::io;

/// Aktuelle Protokollversion
pub const PROTOKOLL_VERSION: u8 = 1;

/// Maximale Anzahl gleichzeitiger Funkgeraete-Eintraege pro Paket
pub const MAX_FREQUENZEN: usize = 16;

/// Maximale Nutzdaten-Laenge (typisches Opus-MTU-Limit)
pub const MAX_NUTZDATEN_LAENGE: usize = 1280;

/// Feste Header-Laenge vor den Frequenz-Eintraegen
pub const HEADER_LAENGE: usize = 60;

/// Laenge eines Frequenz-Eintrags in Bytes
pub const FREQUENZ_EINTRAG_LAENGE: usize = 10;

// ---------------------------------------------------------------------------
// RadioFrequenz
// ---------------------------------------------------------------------------

/// Ein simuliertes Funkgeraet auf dem eine Uebertragung stattfindet
///
/// Ein Paket kann mehrere gleichzeitige Funkgeraete beschreiben
/// (z.B. Hauptgeraet + Retransmit auf Zweitgeraet).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadioFrequenz {
    /// Frequenz in Hz
    pub frequenz: f64,
    /// Modulation (AM/FM/Intercom)
    pub modulation: Modulation,
    /// Verschluesselungs-Schluessel-ID (0 = unverschluesselt)
    pub verschluesselung: u8,
}

impl RadioFrequenz {
    /// Unverschluesselte Uebertragung auf gegebener Frequenz
    pub fn neu(frequenz: f64, modulation: Modulation) -> Self {
        Self {
            frequenz,
            modulation,
            verschluesselung: 0,
        }
    }

    /// Prueft ob die Uebertragung verschluesselt ist
    pub fn ist_verschluesselt(&self) -> bool {
        self.verschluesselung != 0
    }
}

// ---------------------------------------------------------------------------
// VoicePacket
// ---------------------------------------------------------------------------

/// Vollstaendiges Voice-UDP-Paket
#[derive(Debug, Clone, PartialEq)]
pub struct VoicePacket {
    /// Protokollversion (muss == `PROTOKOLL_VERSION` sein)
    pub version: u8,
    /// Anzahl der Relais-Weiterleitungen die dieses Paket durchlaufen hat
    pub hops: u8,
    /// Simulierte Einheit des Senders (fuer Intercom-Filterung)
    pub unit_id: UnitId,
    /// Monoton steigende Paketnummer des Senders
    pub paket_nummer: u64,
    /// Sender dieses Datagramms (bei Relais: der Relais-Client)
    pub sender: ClientGuid,
    /// Urspruenglicher Sender der Uebertragung
    pub original_sender: ClientGuid,
    /// Gleichzeitige Funkgeraete (mindestens eines)
    pub frequenzen: Vec<RadioFrequenz>,
    /// Opake Codec-Nutzdaten
    pub nutzdaten: Vec<u8>,
}

impl VoicePacket {
    /// Erstellt ein neues Erst-Sendung-Paket (Hop-Zaehler 0)
    pub fn neu(
        sender: ClientGuid,
        unit_id: UnitId,
        paket_nummer: u64,
        frequenzen: Vec<RadioFrequenz>,
        nutzdaten: Vec<u8>,
    ) -> Self {
        Self {
            version: PROTOKOLL_VERSION,
            hops: 0,
            unit_id,
            paket_nummer,
            original_sender: sender.clone(),
            sender,
            frequenzen,
            nutzdaten,
        }
    }

    /// Prueft ob rohe Draht-Bytes ein Keepalive-Datagramm sind
    ///
    /// Keepalives sind exakt 22 Bytes (nur die GUID) und werden nie
    /// als Voice dekodiert.
    pub fn ist_keepalive(daten: &[u8]) -> bool {
        daten.len() == GUID_LAENGE
    }

    /// Erhoeht den Hop-Zaehler um exakt eins (beim Weiterleiten)
    pub fn hop_erhoehen(&mut self) {
        self.hops = self.hops.saturating_add(1);
    }

    /// Gibt den ersten Frequenz-Eintrag zurueck (Hauptfrequenz)
    pub fn hauptfrequenz(&self) -> Option<&RadioFrequenz> {
        self.frequenzen.first()
    }

    /// Gesamtgroesse des kodierten Pakets in Bytes
    pub fn groesse(&self) -> usize {
        HEADER_LAENGE + self.frequenzen.len() * FREQUENZ_EINTRAG_LAENGE + self.nutzdaten.len()
    }

    /// Serialisiert das Paket in einen Byte-Vec (big-endian)
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.groesse());
        buf.push(self.version);
        buf.push(self.frequenzen.len() as u8);
        buf.push(self.hops);
        buf.push(0); // reserviert
        buf.extend_from_slice(&self.unit_id.0.to_be_bytes());
        buf.extend_from_slice(&self.paket_nummer.to_be_bytes());
        buf.extend_from_slice(self.sender.as_bytes());
        buf.extend_from_slice(self.original_sender.as_bytes());
        for eintrag in &self.frequenzen {
            buf.extend_from_slice(&eintrag.frequenz.to_be_bytes());
            buf.push(eintrag.modulation as u8);
            buf.push(eintrag.verschluesselung);
        }
        buf.extend_from_slice(&self.nutzdaten);
        buf
    }

    /// Deserialisiert ein Paket aus einem Byte-Slice und validiert es
    ///
    /// # Fehler
    /// - `InvalidData` bei Keepalive-Laenge, falscher Version, ungueltiger
    ///   Eintragszahl, unbekannter Modulation oder zu langen Nutzdaten
    pub fn decode(buf: &[u8]) -> io::Result<Self> {
        if Self::ist_keepalive(buf) {
            return Err(ungueltig("Keepalive-Datagramm ist kein Voice-Paket"));
        }
        if buf.len() < HEADER_LAENGE + FREQUENZ_EINTRAG_LAENGE {
            return Err(ungueltig(format!(
                "Paket zu kurz: {} Bytes (Minimum {})",
                buf.len(),
                HEADER_LAENGE + FREQUENZ_EINTRAG_LAENGE
            )));
        }

        let version = buf[0];
        if version != PROTOKOLL_VERSION {
            return Err(ungueltig(format!(
                "Ungueltige Protokollversion: {} (erwartet {})",
                version, PROTOKOLL_VERSION
            )));
        }

        let anzahl = buf[1] as usize;
        if anzahl == 0 || anzahl > MAX_FREQUENZEN {
            return Err(ungueltig(format!(
                "Ungueltige Frequenz-Anzahl: {anzahl} (erlaubt 1..={MAX_FREQUENZEN})"
            )));
        }

        let eintraege_ende = HEADER_LAENGE + anzahl * FREQUENZ_EINTRAG_LAENGE;
        if buf.len() < eintraege_ende {
            return Err(ungueltig(format!(
                "Paket zu kurz fuer {anzahl} Frequenz-Eintraege: {} Bytes",
                buf.len()
            )));
        }

        let hops = buf[2];
        let unit_id = UnitId(u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]));
        let paket_nummer = u64::from_be_bytes(
            buf[8..16].try_into().expect("Slice-Laenge geprueft"),
        );

        let sender = ClientGuid::from_bytes(&buf[16..16 + GUID_LAENGE])
            .ok_or_else(|| ungueltig("Ungueltige Sender-GUID"))?;
        let original_sender = ClientGuid::from_bytes(&buf[38..38 + GUID_LAENGE])
            .ok_or_else(|| ungueltig("Ungueltige Original-Sender-GUID"))?;

        let mut frequenzen = Vec::with_capacity(anzahl);
        for i in 0..anzahl {
            let offset = HEADER_LAENGE + i * FREQUENZ_EINTRAG_LAENGE;
            let frequenz = f64::from_be_bytes(
                buf[offset..offset + 8].try_into().expect("Slice-Laenge geprueft"),
            );
            let modulation = Modulation::from_u8(buf[offset + 8]).ok_or_else(|| {
                ungueltig(format!("Unbekannte Modulation: {}", buf[offset + 8]))
            })?;
            frequenzen.push(RadioFrequenz {
                frequenz,
                modulation,
                verschluesselung: buf[offset + 9],
            });
        }

        let nutzdaten = &buf[eintraege_ende..];
        if nutzdaten.len() > MAX_NUTZDATEN_LAENGE {
            return Err(ungueltig(format!(
                "Nutzdaten zu lang: {} Bytes (Maximum {})",
                nutzdaten.len(),
                MAX_NUTZDATEN_LAENGE
            )));
        }

        Ok(Self {
            version,
            hops,
            unit_id,
            paket_nummer,
            sender,
            original_sender,
            frequenzen,
            nutzdaten: nutzdaten.to_vec(),
        })
    }
}

fn ungueltig(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
