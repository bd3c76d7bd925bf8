//! Day-boundary gates and packet batching
//!
//! Stages only work on the days the plan gives them. A gate opening drains a
//! holding or rework queue into the stage's stations; a gate closing sweeps
//! whatever is still waiting at those stations into escalation and the stage's
//! rework queue, so nothing carries over silently into the next day. Jobs in
//! service when a gate closes finish normally.

use super::{GateClose, GateOpen, Orchestrator, SimulationResult};
use crate::entities::Job;
use crate::types::{CategoryId, CompletionState, StationId};
use tracing::{debug, instrument};

impl Orchestrator {
    #[instrument(skip(self), fields(now = self.ctx.now()))]
    pub(super) fn open_gate(&mut self, gate: GateOpen) -> SimulationResult<()> {
        let released = match gate {
            GateOpen::ClassificationIntake => {
                let mut released = self.release_classification_intake()?;
                if self.config.routing.combined_stages {
                    released += self.release_coding_holding()?;
                }
                released
            }
            GateOpen::ClassificationRework => {
                let docs = self.classification_rework.drain_all();
                let batch = docs.len();
                for (seq, doc) in docs.into_iter().enumerate() {
                    let index = self.classification_router.route(seq, batch, &mut self.ctx.rng)?;
                    self.send(self.layout.classification[index], doc)?;
                }
                batch
            }
            GateOpen::CodingRework => {
                let mut released = 0;
                for index in 0..self.coding_rework.len() {
                    let docs = self.coding_rework[index].drain_all();
                    released += docs.len();
                    for doc in docs {
                        self.send(self.layout.coding[index], doc)?;
                    }
                }
                released
            }
            GateOpen::PlacementIntake => {
                let mut released = 0;
                for index in 0..self.placement_holding.len() {
                    let packets = self.placement_holding[index].drain_all();
                    released += packets.len();
                    for packet in packets {
                        self.send(self.layout.placement[index], packet)?;
                    }
                }
                released
            }
            GateOpen::PlacementRework => {
                let mut released = 0;
                for index in 0..self.placement_rework.len() {
                    let packets = self.placement_rework[index].drain_all();
                    released += packets.len();
                    for packet in packets {
                        self.send(self.layout.placement[index], packet)?;
                    }
                }
                released
            }
        };
        debug!("Opened {} with {} jobs", gate, released);
        Ok(())
    }

    /// New manual documents follow the assignments made when they arrived
    fn release_classification_intake(&mut self) -> SimulationResult<usize> {
        let docs = self.classification_intake.drain_all();
        let released = docs.len();
        for doc in docs {
            let index = self.classification_plan.next_station()?;
            self.send(self.layout.classification[index], doc)?;
        }
        Ok(released)
    }

    fn release_coding_holding(&mut self) -> SimulationResult<usize> {
        let mut released = 0;
        for index in 0..self.coding_holding.len() {
            let docs = self.coding_holding[index].drain_all();
            released += docs.len();
            for doc in docs {
                self.send(self.layout.coding[index], doc)?;
            }
        }
        Ok(released)
    }

    #[instrument(skip(self), fields(now = self.ctx.now()))]
    pub(super) fn close_gate(&mut self, gate: GateClose) -> SimulationResult<()> {
        let swept = match gate {
            GateClose::Classification => {
                let swept = self.sweep_classification()?;
                let released = self.release_coding_holding()?;
                debug!("Released {} classified documents to coding", released);
                swept
            }
            GateClose::Coding => self.sweep_coding()?,
            GateClose::Combined => self.sweep_combined()?,
            GateClose::Placement => self.sweep_placement()?,
        };
        debug!("Closed {} and swept {} waiting jobs", gate, swept);
        Ok(())
    }

    /// Jobs still queued at `station`, in arrival order
    fn evacuate(&mut self, station: StationId) -> SimulationResult<Vec<Job>> {
        let now = self.ctx.now();
        match self.stations.get_mut(station.0) {
            Some(station) => station.evacuate(now),
            None => Ok(Vec::new()),
        }
    }

    fn sweep_classification(&mut self) -> SimulationResult<usize> {
        let threshold = self.config.quality.late_classification_days;
        let mut swept = 0;
        for station in self.layout.classification.clone() {
            for job in self.evacuate(station)? {
                let mut doc = self.expect_document(job, "classification sweep")?;
                if doc.escalation.end_of_day(threshold) {
                    self.stats.late_jobs.classification.increment();
                }
                self.classification_rework.enqueue(doc);
                swept += 1;
            }
        }
        Ok(swept)
    }

    fn sweep_coding(&mut self) -> SimulationResult<usize> {
        let threshold = self.config.quality.late_coding_days;
        let mut swept = 0;
        for (index, station) in self.layout.coding.clone().into_iter().enumerate() {
            for job in self.evacuate(station)? {
                let mut doc = self.expect_document(job, "coding sweep")?;
                if doc.escalation.end_of_day(threshold) {
                    self.stats.late_jobs.coding.increment();
                }
                self.coding_rework[index].enqueue(doc);
                swept += 1;
            }
        }
        Ok(swept)
    }

    /// Combined stations hold both kinds of work; each goes to its own rework queue
    fn sweep_combined(&mut self) -> SimulationResult<usize> {
        let quality = self.config.quality.clone();
        let mut swept = 0;
        for (index, station) in self.layout.coding.clone().into_iter().enumerate() {
            for job in self.evacuate(station)? {
                let mut doc = self.expect_document(job, "combined sweep")?;
                if doc.completion == CompletionState::PendingClassification {
                    if doc.escalation.end_of_day(quality.late_classification_days) {
                        self.stats.late_jobs.classification.increment();
                    }
                    self.classification_rework.enqueue(doc);
                } else {
                    if doc.escalation.end_of_day(quality.late_coding_days) {
                        self.stats.late_jobs.coding.increment();
                    }
                    self.coding_rework[index].enqueue(doc);
                }
                swept += 1;
            }
        }
        Ok(swept)
    }

    fn sweep_placement(&mut self) -> SimulationResult<usize> {
        let threshold = self.config.quality.late_placement_days;
        let mut swept = 0;
        for (index, station) in self.layout.placement.clone().into_iter().enumerate() {
            for job in self.evacuate(station)? {
                let mut packet = self.expect_packet(job, "placement sweep")?;
                if packet.escalation.end_of_day(threshold) {
                    self.stats.late_jobs.placement.increment();
                }
                self.placement_rework[index].enqueue(packet);
                swept += 1;
            }
        }
        Ok(swept)
    }

    /// Turn every non-empty category holding queue into one packet
    #[instrument(skip(self), fields(now = self.ctx.now()))]
    pub(super) fn batch_packets(&mut self) -> SimulationResult<()> {
        let categories: Vec<CategoryId> = self
            .category_holding
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(category, _)| *category)
            .collect();

        let mut documents = 0;
        for &category in &categories {
            let index = self.placement_index(category)?;
            let Some(queue) = self.category_holding.get_mut(&category) else {
                continue;
            };
            let docs = queue.drain_all();
            documents += docs.len();
            let packet = self.create_packet(category, docs);
            self.placement_holding[index].enqueue(packet);
        }

        crate::sim_event!(
            info,
            "Packets batched",
            packets = categories.len(),
            documents = documents,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::CategoryCatalog;
    use crate::simulation::Orchestrator;
    use crate::types::{DayPlan, SimulationConfig};

    /// One arrival, classification on day 1 only, nothing afterwards
    fn classification_only_plan() -> SimulationConfig {
        SimulationConfig {
            production_period_days: 5,
            arrival_mean: 40_000.0,
            arrival_std_dev: 0.0,
            auto_classification_percentage: 0.0,
            day_plan: DayPlan {
                arrival_days: vec![0],
                classification_days: vec![1],
                coding_days: vec![],
                rework_days: vec![],
                placement_days: vec![],
                placement_rework_days: vec![],
                batching_weeks: vec![],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_classification_close_sweeps_every_waiting_document() {
        let config = classification_only_plan();
        let mut orchestrator = Orchestrator::new(&config, CategoryCatalog::default(), Some(4)).unwrap();
        let close = orchestrator.work_calendar().gate_close_time(1);
        orchestrator.run_until(close).unwrap();

        // 36,000 manual documents: far more than five classifiers finish in a day
        for &station in &orchestrator.layout().classification {
            assert!(orchestrator.station(station).unwrap().queue().is_empty());
        }
        assert!(orchestrator.rework_backlog().classification > 0);
        assert_eq!(orchestrator.intake_len(), 0);
    }

    #[test]
    fn test_swept_documents_are_not_late_after_one_day() {
        let config = classification_only_plan();
        let mut orchestrator = Orchestrator::new(&config, CategoryCatalog::default(), Some(4)).unwrap();
        let close = orchestrator.work_calendar().gate_close_time(1);
        orchestrator.run_until(close).unwrap();
        assert_eq!(orchestrator.statistics().late_jobs.classification.value(), 0);
    }

    #[test]
    fn test_late_documents_are_counted_once() {
        let mut config = classification_only_plan();
        config.arrival_mean = 80_000.0;
        config.quality.late_classification_days = 1;
        config.day_plan.classification_days = vec![1, 2, 3];
        config.day_plan.rework_days = vec![2, 3];
        let mut orchestrator = Orchestrator::new(&config, CategoryCatalog::default(), Some(4)).unwrap();
        let calendar = *orchestrator.work_calendar();

        orchestrator.run_until(calendar.gate_close_time(2)).unwrap();
        let late_after_two_days = orchestrator.statistics().late_jobs.classification.value();
        assert!(late_after_two_days > 0);

        // Still unfinished a day later, but already counted
        orchestrator.run_until(calendar.gate_close_time(3)).unwrap();
        assert!(orchestrator.rework_backlog().classification > 0);
        assert_eq!(orchestrator.statistics().late_jobs.classification.value(), late_after_two_days);
    }
}
