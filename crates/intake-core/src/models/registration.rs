use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Applicant kind. Decides the normalization rules and the broker subject prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationKind {
    Resident,
    Company,
}

impl RegistrationKind {
    /// Environment variable holding the finalization subject prefix.
    pub fn subject_env(&self) -> &'static str {
        match self {
            RegistrationKind::Resident => "REGISTER_INDIVIDUAL_SUBJECT",
            RegistrationKind::Company => "REGISTER_EMPLOYER_SUBJECT",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationKind::Resident => "resident",
            RegistrationKind::Company => "company",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ResidentPlate {
    pub plate_number: String,
    pub vehicle_type: String,
    /// Object key of the vehicle registration document
    pub vehicle_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ResidentSupportingFiles {
    /// Object key of the sale and purchase agreement
    pub spa_path: String,
    pub electric_bill_path: String,
}

/// Resident (individual) enrollment form
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ResidentRegisterForm {
    #[validate(length(min = 3, max = 50))]
    pub resident_name: String,
    #[validate(length(min = 2, max = 10))]
    pub contact_number: String,
    #[validate(email)]
    pub contact_email: String,
    #[validate(length(min = 5, max = 100))]
    pub resident_address_line1: String,
    #[validate(length(max = 100))]
    pub resident_address_line2: String,
    pub nric_number: String,
    pub tin_number: String,
    pub resident_plate: ResidentPlate,
    pub resident_supporting_files: ResidentSupportingFiles,
}

impl ResidentRegisterForm {
    /// Document key fields with their JSON paths, in form order.
    pub fn document_keys(&self) -> Vec<(String, &str)> {
        vec![
            (
                "residentPlate.vehiclePath".to_string(),
                self.resident_plate.vehicle_path.as_str(),
            ),
            (
                "residentSupportingFiles.spaPath".to_string(),
                self.resident_supporting_files.spa_path.as_str(),
            ),
            (
                "residentSupportingFiles.electricBillPath".to_string(),
                self.resident_supporting_files.electric_bill_path.as_str(),
            ),
        ]
    }

    pub fn normalize(&self) -> IndividualRecord {
        IndividualRecord {
            nric: self.nric_number.clone(),
            tin_number: self.tin_number.clone(),
            full_name: self.resident_name.clone(),
            email: self.contact_email.clone(),
            contact_number: self.contact_number.clone(),
            address1: self.resident_address_line1.clone(),
            address2: self.resident_address_line2.clone(),
            vehicle_num: self.resident_plate.plate_number.clone(),
            vehicle_class: self.resident_plate.vehicle_type.clone(),
            vehicle_path: self.resident_plate.vehicle_path.clone(),
            spa_path: self.resident_supporting_files.spa_path.clone(),
            electric_bill_path: self.resident_supporting_files.electric_bill_path.clone(),
        }
    }
}

/// One vehicle of a company registration, owned by its own applicant
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyPlate {
    pub nric_number: String,
    pub plate_number: String,
    pub vehicle_type: String,
    pub spa_path: String,
    pub electric_bill_path: String,
    pub vehicle_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanySupportingFiles {
    /// Object key of the company registry (SSM) certificate
    pub ssm_path: String,
    pub electric_bill_path: String,
    pub vehicle_path: String,
}

/// Company (employer) enrollment form
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyRegisterForm {
    /// Allocated by the backend through `POST /registers/company`
    #[serde(rename = "employerID")]
    pub employer_id: String,
    pub company_registration_number: String,
    pub tin_number: String,
    pub company_name: String,
    pub contact_person: String,
    pub contact_number: String,
    #[validate(email)]
    pub contact_email: String,
    #[validate(length(min = 5, max = 100))]
    pub company_address_line1: String,
    #[validate(length(max = 100))]
    pub company_address_line2: String,
    pub company_plates: Vec<CompanyPlate>,
    pub company_supporting_files: CompanySupportingFiles,
}

impl CompanyRegisterForm {
    /// Document key fields with their JSON paths, plates first.
    pub fn document_keys(&self) -> Vec<(String, &str)> {
        let mut keys = Vec::with_capacity(self.company_plates.len() * 3 + 3);
        for (index, plate) in self.company_plates.iter().enumerate() {
            keys.push((
                format!("companyPlates[{}].spaPath", index),
                plate.spa_path.as_str(),
            ));
            keys.push((
                format!("companyPlates[{}].electricBillPath", index),
                plate.electric_bill_path.as_str(),
            ));
            keys.push((
                format!("companyPlates[{}].vehiclePath", index),
                plate.vehicle_path.as_str(),
            ));
        }
        let files = &self.company_supporting_files;
        keys.push((
            "companySupportingFiles.ssmPath".to_string(),
            files.ssm_path.as_str(),
        ));
        keys.push((
            "companySupportingFiles.electricBillPath".to_string(),
            files.electric_bill_path.as_str(),
        ));
        keys.push((
            "companySupportingFiles.vehiclePath".to_string(),
            files.vehicle_path.as_str(),
        ));
        keys
    }

    /// The backend stores each vehicle+owner pair as an individual registration, so every
    /// plate becomes one individual carrying the company's contact identity.
    pub fn normalize(&self) -> EmployerRecord {
        let individuals = self
            .company_plates
            .iter()
            .map(|plate| IndividualRecord {
                nric: plate.nric_number.clone(),
                tin_number: self.tin_number.clone(),
                full_name: self.contact_person.clone(),
                email: self.contact_email.clone(),
                contact_number: self.contact_number.clone(),
                address1: self.company_address_line1.clone(),
                address2: self.company_address_line2.clone(),
                vehicle_num: plate.plate_number.clone(),
                vehicle_class: plate.vehicle_type.clone(),
                vehicle_path: plate.vehicle_path.clone(),
                spa_path: plate.spa_path.clone(),
                electric_bill_path: plate.electric_bill_path.clone(),
            })
            .collect();

        EmployerRecord {
            employer_id: self.employer_id.clone(),
            company_reg_num: self.company_registration_number.clone(),
            tin_number: self.tin_number.clone(),
            employer_name: self.company_name.clone(),
            contact_person: self.contact_person.clone(),
            contact_number: self.contact_number.clone(),
            email: self.contact_email.clone(),
            address1: self.company_address_line1.clone(),
            address2: self.company_address_line2.clone(),
            individuals,
            company_supporting_files: self.company_supporting_files.clone(),
        }
    }
}

/// A form bound from a finalize request, tagged by applicant kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationForm {
    Resident(ResidentRegisterForm),
    Company(CompanyRegisterForm),
}

impl RegistrationForm {
    pub fn kind(&self) -> RegistrationKind {
        match self {
            RegistrationForm::Resident(_) => RegistrationKind::Resident,
            RegistrationForm::Company(_) => RegistrationKind::Company,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            RegistrationForm::Resident(form) => form.validate(),
            RegistrationForm::Company(form) => form.validate(),
        }
    }

    pub fn document_keys(&self) -> Vec<(String, &str)> {
        match self {
            RegistrationForm::Resident(form) => form.document_keys(),
            RegistrationForm::Company(form) => form.document_keys(),
        }
    }

    pub fn normalize(&self) -> NormalizedRegistration {
        match self {
            RegistrationForm::Resident(form) => NormalizedRegistration::Individual(form.normalize()),
            RegistrationForm::Company(form) => NormalizedRegistration::Employer(form.normalize()),
        }
    }
}

/// Individual registration unit in the backend's data model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualRecord {
    pub nric: String,
    pub tin_number: String,
    pub full_name: String,
    pub email: String,
    pub contact_number: String,
    pub address1: String,
    pub address2: String,
    pub vehicle_num: String,
    pub vehicle_class: String,
    pub vehicle_path: String,
    pub spa_path: String,
    pub electric_bill_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerRecord {
    #[serde(rename = "employerID")]
    pub employer_id: String,
    pub company_reg_num: String,
    pub tin_number: String,
    pub employer_name: String,
    pub contact_person: String,
    pub contact_number: String,
    pub email: String,
    pub address1: String,
    pub address2: String,
    pub individuals: Vec<IndividualRecord>,
    pub company_supporting_files: CompanySupportingFiles,
}

/// Broker payload, serialized as the bare record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedRegistration {
    Individual(IndividualRecord),
    Employer(EmployerRecord),
}

/// Response of the validate-only registration endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterIdResponse {
    #[serde(rename = "registerID")]
    pub register_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyRegisterResponse {
    #[serde(rename = "registerID")]
    pub register_id: Uuid,
    #[serde(rename = "employerID")]
    pub employer_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResidentFinalizeResponse {
    pub resident_name: String,
    /// Backend reply: decoded JSON, or the raw reply text
    #[serde(rename = "natsResponse")]
    #[schema(value_type = Object)]
    pub broker_response: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyFinalizeResponse {
    /// Company registration number
    pub id: String,
    #[serde(rename = "natsResponse")]
    #[schema(value_type = Object)]
    pub broker_response: serde_json::Value,
}
