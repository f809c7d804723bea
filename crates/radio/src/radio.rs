//! Zustand simulierter Funkgeraete
//!
//! Jeder Client besitzt einen `RadioSet` mit mehreren Geraeten. Die Felder
//! werden vom Besitzer-Client aus der Simulation synchronisiert (Frequenz,
//! Modulation, Verschluesselung, Empfangsqualitaet, Sichtlinien-Verlust)
//! und vom Router nur gelesen.

use funklink_core::types::{Modulation, UnitId};
use serde::{Deserialize, Serialize};

/// Zustand eines einzelnen simulierten Funkgeraets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Radio {
    /// Eingestellte Frequenz in Hz (0.0 = ungetuned)
    pub frequenz: f64,
    /// Zweitfrequenz/Guard in Hz (0.0 = keine)
    pub zweitfrequenz: f64,
    /// Modulation des Geraets
    pub modulation: Modulation,
    /// Verschluesselungs-Schluessel-ID (0 = unverschluesselt)
    pub schluessel: u8,
    /// Wiedergabe-Lautstaerke (0.0–1.0)
    pub lautstaerke: f32,
    /// Empfangsqualitaet aus der Simulation (0.0–1.0, 1.0 = voller Empfang)
    pub empfangsqualitaet: f64,
    /// Sichtlinien-Verlust aus der Simulation (0.0 = freie Sicht, 1.0 = blockiert)
    pub los_verlust: f32,
    /// Relais-Geraet: empfangenes Audio wird vom Client auf den uebrigen
    /// Geraeten erneut gesendet (der Hop-Zaehler begrenzt die Kette)
    pub relais: bool,
}

impl Radio {
    /// Ein abgeschaltetes Geraet (Platzhalter im Geraetesatz)
    pub fn abgeschaltet() -> Self {
        Self {
            frequenz: 0.0,
            zweitfrequenz: 0.0,
            modulation: Modulation::Disabled,
            schluessel: 0,
            lautstaerke: 1.0,
            empfangsqualitaet: 0.0,
            los_verlust: 0.0,
            relais: false,
        }
    }

    /// Ein betriebsbereites Geraet auf gegebener Frequenz
    pub fn neu(frequenz: f64, modulation: Modulation) -> Self {
        Self {
            frequenz,
            zweitfrequenz: 0.0,
            modulation,
            schluessel: 0,
            lautstaerke: 1.0,
            empfangsqualitaet: 1.0,
            los_verlust: 0.0,
            relais: false,
        }
    }

    /// Bord-Intercom-Geraet
    pub fn intercom() -> Self {
        Self::neu(0.0, Modulation::Intercom)
    }

    /// Prueft ob das Geraet empfangsbereit ist
    pub fn ist_aktiv(&self) -> bool {
        self.modulation != Modulation::Disabled
    }
}

impl Default for Radio {
    fn default() -> Self {
        Self::abgeschaltet()
    }
}

/// Geraetesatz eines Clients: alle Funkgeraete plus Einheiten-Zuordnung
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadioSet {
    /// Simulierte Einheit zu der die Geraete gehoeren
    pub unit_id: UnitId,
    /// Funkgeraete, Index = Geraete-Nummer
    pub radios: Vec<Radio>,
}

impl RadioSet {
    /// Leerer Geraetesatz ohne Einheit
    pub fn leer() -> Self {
        Self::default()
    }

    /// Geraetesatz mit Einheit und Geraeten
    pub fn neu(unit_id: UnitId, radios: Vec<Radio>) -> Self {
        Self { unit_id, radios }
    }

    /// Prueft ob irgendein Geraet empfangsbereit ist
    pub fn hat_aktive_geraete(&self) -> bool {
        self.radios.iter().any(Radio::ist_aktiv)
    }

    /// Prueft ob ein Bord-Intercom verfuegbar ist
    pub fn hat_intercom(&self) -> bool {
        self.radios
            .iter()
            .any(|radio| radio.modulation == Modulation::Intercom)
    }
}
