//! Employees, automated servers and the pools stations draw them from
//!
//! The [`Workforce`] owns every server of a replication. Stations never own
//! servers; they hold a [`ResourcePool`], an ordered list of member identifiers
//! into the workforce. Two stations may list the same employee (coding staff
//! who also classify, support staff shared by every support sub-stage), so an
//! employee busy at one station is busy at all of them.

use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{defaults, EmployeeId, StaffingConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Team an employee belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Dedicated classification staff
    Classification,
    /// Coding staff (also classify when there is no classification team)
    Coding,
    /// Placement staff
    Placement,
    /// Support staff (validation, NIL, feedback, submission, change requests)
    Support,
    /// Automated classifier
    AutomatedClassifier,
    /// The client, reviewing NIL reports
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Classification => write!(f, "Classification"),
            Role::Coding => write!(f, "Coding"),
            Role::Placement => write!(f, "Placement"),
            Role::Support => write!(f, "Support"),
            Role::AutomatedClassifier => write!(f, "Automated Classifier"),
            Role::Client => write!(f, "Client"),
        }
    }
}

/// A server: one employee (capacity 1) or one automated facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Identifier inside the workforce
    pub id: EmployeeId,
    /// Team
    pub role: Role,
    /// Still in training (slower service times)
    pub training: bool,
    /// Jobs that can be in service at once
    pub capacity: u32,
    busy: u32,
}

impl Employee {
    /// Jobs currently in service
    pub fn busy(&self) -> u32 {
        self.busy
    }

    /// Whether another job can be seized onto this server
    pub fn is_idle(&self) -> bool {
        self.busy < self.capacity
    }
}

/// Every server of one replication
#[derive(Debug, Clone, Default)]
pub struct Workforce {
    employees: Vec<Employee>,
}

impl Workforce {
    /// Create an empty workforce
    pub fn new() -> Self {
        Self::default()
    }

    /// Hire the staff described by `staffing` plus the automated servers
    ///
    /// Trained members of a team are hired before its trainees, so trained staff
    /// occupy the lowest positions in every pool.
    pub fn from_staffing(staffing: &StaffingConfig) -> Self {
        let mut workforce = Self::new();
        for (role, trained, trainees) in [
            (Role::Classification, staffing.classification_employees, staffing.classification_trainees),
            (Role::Coding, staffing.coding_employees, staffing.coding_trainees),
            (Role::Placement, staffing.placement_employees, staffing.placement_trainees),
            (Role::Support, staffing.support_employees, staffing.support_trainees),
        ] {
            for _ in 0..trained {
                workforce.hire(role, false, 1);
            }
            for _ in 0..trainees {
                workforce.hire(role, true, 1);
            }
        }
        workforce.hire(Role::AutomatedClassifier, false, defaults::AUTOMATED_CAPACITY);
        workforce.hire(Role::Client, false, defaults::AUTOMATED_CAPACITY);
        workforce
    }

    /// Add one server and return its identifier
    pub fn hire(&mut self, role: Role, training: bool, capacity: u32) -> EmployeeId {
        let id = EmployeeId(self.employees.len() as u32);
        self.employees.push(Employee { id, role, training, capacity, busy: 0 });
        id
    }

    /// Look up a server
    pub fn get(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: EmployeeId) -> SimulationResult<&mut Employee> {
        self.employees
            .get_mut(id.0 as usize)
            .ok_or_else(|| SimulationError::resource_invariant_error(format!("unknown server {}", id)))
    }

    /// Members of a team in hiring order
    pub fn members(&self, role: Role) -> Vec<EmployeeId> {
        self.employees.iter().filter(|e| e.role == role).map(|e| e.id).collect()
    }

    /// Number of servers
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    /// Whether no server has been hired
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// All servers
    pub fn iter(&self) -> impl Iterator<Item = &Employee> {
        self.employees.iter()
    }

    /// Whether a server is known and idle
    pub fn is_idle(&self, id: EmployeeId) -> bool {
        self.get(id).map(Employee::is_idle).unwrap_or(false)
    }

    /// Take one unit of a server's capacity
    pub fn seize(&mut self, id: EmployeeId) -> SimulationResult<()> {
        let employee = self.get_mut(id)?;
        if !employee.is_idle() {
            return Err(SimulationError::resource_invariant_error(format!(
                "seize of {} beyond capacity {}",
                id, employee.capacity
            )));
        }
        employee.busy += 1;
        Ok(())
    }

    /// Return one unit of a server's capacity
    pub fn release(&mut self, id: EmployeeId) -> SimulationResult<()> {
        let employee = self.get_mut(id)?;
        if employee.busy == 0 {
            return Err(SimulationError::resource_invariant_error(format!(
                "release of idle server {}",
                id
            )));
        }
        employee.busy -= 1;
        Ok(())
    }

    /// Total units in service across the workforce
    pub fn total_busy(&self) -> u32 {
        self.employees.iter().map(|e| e.busy).sum()
    }
}

/// Ordered view of the servers a station may seize
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourcePool {
    members: Vec<EmployeeId>,
}

impl ResourcePool {
    /// Pool over the given servers, scanned in the given order
    pub fn new(members: Vec<EmployeeId>) -> Self {
        Self { members }
    }

    /// Pool of a single server
    pub fn single(member: EmployeeId) -> Self {
        Self { members: vec![member] }
    }

    /// Members in scan order
    pub fn members(&self) -> &[EmployeeId] {
        &self.members
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the pool has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// First idle member in list order
    pub fn first_idle(&self, workforce: &Workforce) -> Option<EmployeeId> {
        self.members.iter().copied().find(|&id| workforce.is_idle(id))
    }

    /// Whether any member is idle
    pub fn has_idle(&self, workforce: &Workforce) -> bool {
        self.first_idle(workforce).is_some()
    }

    /// Units in service across the members
    pub fn busy(&self, workforce: &Workforce) -> u32 {
        self.members.iter().filter_map(|&id| workforce.get(id)).map(Employee::busy).sum()
    }

    /// Total capacity across the members
    pub fn capacity(&self, workforce: &Workforce) -> u32 {
        self.members.iter().filter_map(|&id| workforce.get(id)).map(|e| e.capacity).sum()
    }
}
