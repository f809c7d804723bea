//! Gemeinsame Basis-Typen fuer Funklink
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen. Die
//! `ClientGuid` ist bewusst exakt 22 ASCII-Zeichen lang, da sie auf dem
//! UDP-Draht als 22-Byte-Keepalive-Datagramm dient.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Laenge einer ClientGuid in ASCII-Bytes (und damit eines Keepalive-Pakets)
pub const GUID_LAENGE: usize = 22;

// ---------------------------------------------------------------------------
// ClientGuid
// ---------------------------------------------------------------------------

/// Eindeutige Client-Kennung – 22 ASCII-Zeichen (Base64-URL einer UUID)
///
/// Die feste Laenge ist Teil des Wire-Formats: ein Datagramm das exakt
/// 22 Bytes lang ist, wird als Keepalive interpretiert, nie als Voice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientGuid(String);

impl ClientGuid {
    /// Erstellt eine neue zufaellige ClientGuid
    pub fn neu() -> Self {
        let uuid = Uuid::new_v4();
        Self(URL_SAFE_NO_PAD.encode(uuid.as_bytes()))
    }

    /// Validiert und uebernimmt eine bestehende Kennung
    ///
    /// Gibt `None` zurueck wenn die Laenge nicht stimmt oder
    /// Nicht-ASCII-Zeichen enthalten sind.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == GUID_LAENGE && s.is_ascii() {
            Some(Self(s.to_owned()))
        } else {
            None
        }
    }

    /// Liest eine ClientGuid aus rohen Draht-Bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        std::str::from_utf8(bytes).ok().and_then(Self::parse)
    }

    /// Gibt die Kennung als String-Slice zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Gibt die 22 ASCII-Bytes fuer das Wire-Format zurueck
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for ClientGuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// UnitId
// ---------------------------------------------------------------------------

/// Kennung der simulierten Einheit (Flugzeug/Fahrzeug) eines Clients
///
/// `0` bedeutet "keine Einheit" (z.B. Zuschauer ohne Cockpit).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, PartialOrd, Ord,
)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Prueft ob eine echte Einheit zugeordnet ist
    pub fn ist_gesetzt(&self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unit:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Coalition
// ---------------------------------------------------------------------------

/// Koalition/Seite eines Clients in der Simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Coalition {
    /// Zuschauer ohne Seite
    Spectator = 0,
    /// Rote Seite
    Red = 1,
    /// Blaue Seite
    Blue = 2,
}

impl Coalition {
    /// Konvertiert ein Byte in eine `Coalition`
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Spectator),
            1 => Some(Self::Red),
            2 => Some(Self::Blue),
            _ => None,
        }
    }
}

impl Default for Coalition {
    fn default() -> Self {
        Self::Spectator
    }
}

// ---------------------------------------------------------------------------
// Modulation
// ---------------------------------------------------------------------------

/// Simulierte Wellenform eines Funkgeraets
///
/// Die Modulation muss zwischen Sender und Empfaenger exakt
/// uebereinstimmen, damit eine Uebertragung hoerbar ist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Modulation {
    /// Amplitudenmodulation
    Am = 0,
    /// Frequenzmodulation (mit Capture-Effekt bei Ueberlagerung)
    Fm = 1,
    /// Bord-Intercom (kein Funk, nur innerhalb derselben Einheit)
    Intercom = 2,
    /// Funkgeraet abgeschaltet
    Disabled = 3,
}

impl Modulation {
    /// Konvertiert ein Byte in eine `Modulation`
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Am),
            1 => Some(Self::Fm),
            2 => Some(Self::Intercom),
            3 => Some(Self::Disabled),
            _ => None,
        }
    }
}

impl std::fmt::Display for Modulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Am => "AM",
            Self::Fm => "FM",
            Self::Intercom => "INTERCOM",
            Self::Disabled => "DISABLED",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
