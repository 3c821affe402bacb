//! Test fixtures: registration forms as clients send them.

use serde_json::{json, Value};

pub const REGISTER_ID: &str = "4b0d6c1e-9a7f-4d7b-8a1f-3c2e5d6f7a8b";

pub fn resident_form() -> Value {
    json!({
        "residentName": "Nur Aisyah",
        "contactNumber": "0123456789",
        "contactEmail": "aisyah@example.com",
        "residentAddressLine1": "21 Jalan Bukit Bintang",
        "residentAddressLine2": "Kuala Lumpur",
        "nricNumber": "950505-14-2222",
        "tinNumber": "IG20251234",
        "residentPlate": {
            "plateNumber": "VAB1234",
            "vehicleType": "car",
            "vehiclePath": format!("uploads/{}/plates/VAB1234_grant.pdf", REGISTER_ID)
        },
        "residentSupportingFiles": {
            "spaPath": format!("uploads/{}/general/spa.pdf", REGISTER_ID),
            "electricBillPath": format!("uploads/{}/general/bill.pdf", REGISTER_ID)
        }
    })
}

pub fn company_form(employer_id: &str) -> Value {
    json!({
        "employerID": employer_id,
        "companyRegistrationNumber": "202001012345",
        "tinNumber": "C2589988776",
        "companyName": "Sinar Haulage Sdn Bhd",
        "contactPerson": "Lim Kok Wai",
        "contactNumber": "0387654321",
        "contactEmail": "fleet@sinar.example",
        "companyAddressLine1": "Lot 88, Jalan Perusahaan",
        "companyAddressLine2": "Klang",
        "companyPlates": [
            {
                "nricNumber": "800808-10-3333",
                "plateNumber": "BKL100",
                "vehicleType": "lorry",
                "vehiclePath": format!("uploads/{}/plates/BKL100_grant.pdf", REGISTER_ID)
            },
            {
                "nricNumber": "820909-10-4444",
                "plateNumber": "BKL200",
                "vehicleType": "van",
                "vehiclePath": format!("uploads/{}/plates/BKL200_grant.pdf", REGISTER_ID)
            }
        ],
        "companySupportingFiles": {
            "ssmPath": format!("uploads/{}/general/{}_ssm.pdf", REGISTER_ID, employer_id)
        }
    })
}
