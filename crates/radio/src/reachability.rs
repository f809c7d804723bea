//! Erreichbarkeits-Entscheidung: welches Geraet eines Empfaengers hoert
//! eine gegebene Uebertragung?
//!
//! Die Funktionen hier sind rein: kein I/O, keine Uhr, kein globaler
//! Zustand. Der Router und die Client-Pipeline rufen sie mit dem jeweils
//! aktuellen Geraetesatz auf und treffen auf Basis des Ergebnisses ihre
//! Weiterleitungs- bzw. Misch-Entscheidung.

use funklink_core::types::{Modulation, UnitId};

use crate::radio::RadioSet;

/// Maximale Abweichung in Hz, bei der zwei Frequenzen noch als
/// "gleicher Kanal" gelten
pub const FREQUENZ_TOLERANZ_HZ: f64 = 500.0;

/// Eine laufende Uebertragung aus Sicht eines potenziellen Empfaengers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uebertragung {
    /// Sendefrequenz in Hz
    pub frequenz: f64,
    /// Modulation des Senders
    pub modulation: Modulation,
    /// Verschluesselungs-Schluessel-ID des Senders (0 = unverschluesselt)
    pub schluessel: u8,
    /// Einheit des Senders (fuer Intercom-Abgleich)
    pub sender_unit: UnitId,
}

/// Ergebnis der Erreichbarkeits-Pruefung fuer ein einzelnes Geraet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Empfang {
    /// Index des empfangenden Geraets im Geraetesatz
    pub radio_index: usize,
    /// Empfang ueber die Zweitfrequenz statt der Hauptfrequenz
    pub sekundaer: bool,
    /// Effektive Empfangsstaerke (Qualitaet abzueglich Sichtlinien-Verlust)
    pub empfangsstaerke: f64,
    /// Sichtlinien-Verlust des Geraets (fuer Stoer-Effekte in der Pipeline)
    pub los_verlust: f32,
    /// false wenn der Schluessel nicht passt: hoerbar, aber nur Rauschen
    pub entschluesselbar: bool,
}

/// Prueft ob zwei Frequenzen innerhalb der Kanal-Toleranz liegen
pub fn frequenz_nah_genug(a: f64, b: f64) -> bool {
    a > 0.0 && b > 0.0 && (a - b).abs() <= FREQUENZ_TOLERANZ_HZ
}

/// Ermittelt das beste empfangende Geraet eines Geraetesatzes fuer eine
/// Uebertragung.
///
/// Regeln:
/// - Modulation muss exakt uebereinstimmen, abgeschaltete Geraete hoeren nie
/// - Intercom traegt keine Frequenz und erreicht nur dieselbe Einheit
/// - `gesperrte` Geraete-Indizes (z.B. gerade selbst sendend) sind
///   ausgeschlossen
/// - Passt der Schluessel nicht, haengt das Verhalten von
///   `strikte_verschluesselung` ab: strikt = gar kein Empfang, sonst
///   Empfang mit `entschluesselbar = false`
/// - Bei mehreren Treffern gewinnt die hoechste Empfangsstaerke, bei
///   Gleichstand der kleinste Geraete-Index
pub fn bestes_empfangsgeraet(
    satz: &RadioSet,
    uebertragung: &Uebertragung,
    gesperrte: &[usize],
    strikte_verschluesselung: bool,
) -> Option<Empfang> {
    let mut bester: Option<Empfang> = None;

    for (index, radio) in satz.radios.iter().enumerate() {
        if gesperrte.contains(&index) {
            continue;
        }
        if radio.modulation != uebertragung.modulation {
            continue;
        }

        let sekundaer = match radio.modulation {
            Modulation::Disabled => continue,
            Modulation::Intercom => {
                // Intercom: gleiche Einheit statt Frequenzabgleich
                if !satz.unit_id.ist_gesetzt()
                    || satz.unit_id != uebertragung.sender_unit
                {
                    continue;
                }
                false
            }
            Modulation::Am | Modulation::Fm => {
                if frequenz_nah_genug(radio.frequenz, uebertragung.frequenz) {
                    false
                } else if frequenz_nah_genug(radio.zweitfrequenz, uebertragung.frequenz) {
                    true
                } else {
                    continue;
                }
            }
        };

        let entschluesselbar = uebertragung.schluessel == 0
            || radio.schluessel == uebertragung.schluessel;
        if !entschluesselbar && strikte_verschluesselung {
            continue;
        }

        let staerke = radio.empfangsqualitaet * (1.0 - f64::from(radio.los_verlust));
        if staerke <= 0.0 {
            continue;
        }

        let kandidat = Empfang {
            radio_index: index,
            sekundaer,
            empfangsstaerke: staerke,
            los_verlust: radio.los_verlust,
            entschluesselbar,
        };
        // Gleichstand behaelt den frueheren Index
        match &bester {
            Some(b) if b.empfangsstaerke >= staerke => {}
            _ => bester = Some(kandidat),
        }
    }

    bester
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::Radio;

    fn am_uebertragung(frequenz: f64) -> Uebertragung {
        Uebertragung {
            frequenz,
            modulation: Modulation::Am,
            schluessel: 0,
            sender_unit: UnitId(100),
        }
    }

    #[test]
    fn frequenz_toleranz_grenzen() {
        assert!(frequenz_nah_genug(251_000_000.0, 251_000_000.0));
        assert!(frequenz_nah_genug(251_000_000.0, 251_000_500.0));
        assert!(!frequenz_nah_genug(251_000_000.0, 251_000_501.0));
        assert!(!frequenz_nah_genug(0.0, 0.0));
    }

    #[test]
    fn passende_frequenz_und_modulation_empfaengt() {
        let satz = RadioSet::neu(UnitId(1), vec![Radio::neu(251e6, Modulation::Am)]);
        let empfang =
            bestes_empfangsgeraet(&satz, &am_uebertragung(251e6), &[], false).unwrap();
        assert_eq!(empfang.radio_index, 0);
        assert!(!empfang.sekundaer);
        assert!(empfang.entschluesselbar);
    }

    #[test]
    fn falsche_modulation_hoert_nichts() {
        let satz = RadioSet::neu(UnitId(1), vec![Radio::neu(251e6, Modulation::Fm)]);
        assert!(bestes_empfangsgeraet(&satz, &am_uebertragung(251e6), &[], false).is_none());
    }

    #[test]
    fn abgeschaltetes_geraet_hoert_nichts() {
        let satz = RadioSet::neu(UnitId(1), vec![Radio::abgeschaltet()]);
        assert!(bestes_empfangsgeraet(&satz, &am_uebertragung(251e6), &[], false).is_none());
    }

    #[test]
    fn zweitfrequenz_setzt_sekundaer_flag() {
        let mut radio = Radio::neu(243e6, Modulation::Am);
        radio.zweitfrequenz = 251e6;
        let satz = RadioSet::neu(UnitId(1), vec![radio]);
        let empfang =
            bestes_empfangsgeraet(&satz, &am_uebertragung(251e6), &[], false).unwrap();
        assert!(empfang.sekundaer);
    }

    #[test]
    fn intercom_nur_gleiche_einheit() {
        let uebertragung = Uebertragung {
            frequenz: 0.0,
            modulation: Modulation::Intercom,
            schluessel: 0,
            sender_unit: UnitId(42),
        };
        let gleich = RadioSet::neu(UnitId(42), vec![Radio::intercom()]);
        let fremd = RadioSet::neu(UnitId(43), vec![Radio::intercom()]);
        let ohne = RadioSet::neu(UnitId(0), vec![Radio::intercom()]);
        assert!(bestes_empfangsgeraet(&gleich, &uebertragung, &[], false).is_some());
        assert!(bestes_empfangsgeraet(&fremd, &uebertragung, &[], false).is_none());
        assert!(bestes_empfangsgeraet(&ohne, &uebertragung, &[], false).is_none());
    }

    #[test]
    fn strikte_verschluesselung_blockt_falschen_schluessel() {
        let mut radio = Radio::neu(251e6, Modulation::Am);
        radio.schluessel = 3;
        let satz = RadioSet::neu(UnitId(1), vec![radio]);
        let mut uebertragung = am_uebertragung(251e6);
        uebertragung.schluessel = 7;

        assert!(bestes_empfangsgeraet(&satz, &uebertragung, &[], true).is_none());
        let lax = bestes_empfangsgeraet(&satz, &uebertragung, &[], false).unwrap();
        assert!(!lax.entschluesselbar);
    }

    #[test]
    fn passender_schluessel_entschluesselbar() {
        let mut radio = Radio::neu(251e6, Modulation::Am);
        radio.schluessel = 3;
        let satz = RadioSet::neu(UnitId(1), vec![radio]);
        let mut uebertragung = am_uebertragung(251e6);
        uebertragung.schluessel = 3;
        let empfang = bestes_empfangsgeraet(&satz, &uebertragung, &[], true).unwrap();
        assert!(empfang.entschluesselbar);
    }

    #[test]
    fn gesperrtes_geraet_wird_uebersprungen() {
        let satz = RadioSet::neu(
            UnitId(1),
            vec![
                Radio::neu(251e6, Modulation::Am),
                Radio::neu(251e6, Modulation::Am),
            ],
        );
        let empfang =
            bestes_empfangsgeraet(&satz, &am_uebertragung(251e6), &[0], false).unwrap();
        assert_eq!(empfang.radio_index, 1);
        assert!(bestes_empfangsgeraet(&satz, &am_uebertragung(251e6), &[0, 1], false).is_none());
    }

    #[test]
    fn hoechste_empfangsstaerke_gewinnt() {
        let mut schwach = Radio::neu(251e6, Modulation::Am);
        schwach.empfangsqualitaet = 0.4;
        let stark = Radio::neu(251e6, Modulation::Am);
        let satz = RadioSet::neu(UnitId(1), vec![schwach, stark]);
        let empfang =
            bestes_empfangsgeraet(&satz, &am_uebertragung(251e6), &[], false).unwrap();
        assert_eq!(empfang.radio_index, 1);
    }

    #[test]
    fn gleichstand_behaelt_kleinsten_index() {
        let satz = RadioSet::neu(
            UnitId(1),
            vec![
                Radio::neu(251e6, Modulation::Am),
                Radio::neu(251e6, Modulation::Am),
            ],
        );
        let empfang =
            bestes_empfangsgeraet(&satz, &am_uebertragung(251e6), &[], false).unwrap();
        assert_eq!(empfang.radio_index, 0);
    }

    #[test]
    fn los_verlust_reduziert_staerke() {
        let mut blockiert = Radio::neu(251e6, Modulation::Am);
        blockiert.los_verlust = 1.0;
        let satz = RadioSet::neu(UnitId(1), vec![blockiert]);
        // Voller Sichtlinien-Verlust ergibt Staerke 0 und damit keinen Empfang
        assert!(bestes_empfangsgeraet(&satz, &am_uebertragung(251e6), &[], false).is_none());
    }

    #[test]
    fn entscheidung_ist_deterministisch() {
        let mut a = Radio::neu(251e6, Modulation::Am);
        a.empfangsqualitaet = 0.7;
        let mut b = Radio::neu(251e6, Modulation::Am);
        b.empfangsqualitaet = 0.9;
        b.los_verlust = 0.3;
        let satz = RadioSet::neu(UnitId(1), vec![a, b]);
        let uebertragung = am_uebertragung(251e6);

        let erste = bestes_empfangsgeraet(&satz, &uebertragung, &[], false);
        for _ in 0..10 {
            assert_eq!(erste, bestes_empfangsgeraet(&satz, &uebertragung, &[], false));
        }
        // 0.7 > 0.9 * (1 - 0.3)
        assert_eq!(erste.unwrap().radio_index, 0);
    }
}
